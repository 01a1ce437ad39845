//! Bourdoncle's weak-topological-order construction: an iterative DFS with an offline LCA pass,
//! followed by bottom-up SCC condensation driven by a second union-find.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::cfg::Cfg;
use crate::checker::CheckerSet;
use crate::errors::WtoError;
use crate::macros::bug;
use crate::wto::component::Component;
use crate::wto::metadata::WtoMetadata;
use crate::wto::union_find::NodeUnionFind;
use crate::wto::Wto;

/// Builds a [`Wto`] for `cfg`, consulting `checkers` to populate `has_check`.
pub(crate) fn build<G, V, Ctx>(cfg: &G, checkers: &CheckerSet<'_, G, V, Ctx>) -> Result<Wto<G::Node>, WtoError>
where
    G: Cfg,
{
    let entry = cfg.entry();

    // ---- Pass 1: iterative DFS, edge classification, offline LCA ----
    let mut dfn: HashMap<G::Node, u32> = HashMap::new();
    let mut post_dfn: HashMap<G::Node, u32> = HashMap::new();
    let mut order: Vec<G::Node> = Vec::new();
    let mut finished: HashSet<G::Node> = HashSet::new();
    let mut non_back_preds: HashMap<G::Node, Vec<G::Node>> = HashMap::new();
    let mut back_preds: HashMap<G::Node, Vec<G::Node>> = HashMap::new();
    let mut cross_fwds: HashMap<G::Node, Vec<(G::Node, G::Node)>> = HashMap::new();

    let mut lca_uf: NodeUnionFind<G::Node> = NodeUnionFind::new();
    let mut ancestor: HashMap<G::Node, G::Node> = HashMap::new();

    let mut next_dfn: u32 = 1;
    let mut next_post_dfn: u32 = 1;

    // (node, search_complete, predecessor)
    let mut stack: Vec<(G::Node, bool, Option<G::Node>)> = vec![(entry, false, None)];

    while let Some((node, complete, pred)) = stack.pop() {
        if complete {
            post_dfn.insert(node, next_post_dfn);
            next_post_dfn += 1;
            finished.insert(node);

            if let Some(p) = pred {
                lca_uf.union(node, p);
                let root = lca_uf.find(p);
                ancestor.insert(root, p);
            }
            continue;
        }

        if dfn.contains_key(&node) {
            // Already discovered: a forward edge onto a node still being processed. Redundant,
            // ignored — this is not a tree/forward edge either, just the duplicate stack entry
            // pushed by a second predecessor.
            continue;
        }

        dfn.insert(node, next_dfn);
        next_dfn += 1;
        order.push(node);
        lca_uf.make_set(node);
        ancestor.insert(node, node);

        stack.push((node, true, pred));

        for succ in cfg.successors(node).into_iter().rev() {
            match dfn.get(&succ).copied() {
                None => stack.push((succ, false, Some(node))),
                Some(_) if finished.contains(&succ) => {
                    let root = lca_uf.find(succ);
                    let lca = *ancestor.get(&root).unwrap_or_else(|| bug!("LCA ancestor missing for {succ:?}"));
                    cross_fwds.entry(lca).or_default().push((node, succ));
                }
                Some(_) => {
                    back_preds.entry(succ).or_default().push(node);
                }
            }
        }

        if let Some(p) = pred {
            non_back_preds.entry(node).or_default().push(p);
        }
    }

    let all_nodes = cfg.nodes();
    if all_nodes.is_empty() {
        return Err(WtoError::EmptyGraph { entry: format!("{entry:?}") });
    }
    for n in &all_nodes {
        if !dfn.contains_key(n) {
            return Err(WtoError::UnreachableNode {
                entry: format!("{entry:?}"),
                node: format!("{n:?}"),
            });
        }
    }

    // ---- Pass 2: bottom-up SCC condensation ----
    let mut scc_uf: NodeUnionFind<G::Node> = NodeUnionFind::new();
    let mut rep: HashMap<G::Node, G::Node> = HashMap::new();
    for &v in &order {
        scc_uf.make_set(v);
        rep.insert(v, v);
    }

    let mut comp_table: HashMap<G::Node, Component<G::Node>> = HashMap::new();
    let mut parent: HashMap<G::Node, G::Node> = HashMap::new();
    let mut is_head: HashSet<G::Node> = HashSet::new();
    let mut is_in_loop: HashSet<G::Node> = HashSet::new();
    let mut children_with_post: HashMap<G::Node, HashSet<G::Node>> = HashMap::new();
    let mut succ_table: HashMap<G::Node, (G::Node, bool)> = HashMap::new();
    let mut has_check: HashSet<G::Node> = HashSet::new();
    let mut calls: Vec<G::Node> = Vec::new();

    let mut set_call_check = |h: G::Node,
                               has_check: &mut HashSet<G::Node>,
                               calls: &mut Vec<G::Node>| {
        let stmts = cfg.statements(h);
        if stmts.iter().any(|s| G::as_call(s).is_some()) {
            calls.push(h);
        }
        if stmts.iter().any(|s| checkers.has_check(s)) {
            has_check.insert(h);
        }
    };

    for hn in (1..next_dfn).rev() {
        let h = order[(hn - 1) as usize];

        if let Some(edges) = cross_fwds.get(&h) {
            for &(u, v) in edges {
                let rep_v = *rep.get(&scc_uf.find(v)).unwrap_or_else(|| bug!("missing rep for {v:?}"));
                non_back_preds.entry(rep_v).or_default().push(u);
            }
        }

        let mut is_scc = false;
        let mut backpreds_h: HashSet<G::Node> = HashSet::new();
        if let Some(bp) = back_preds.get(&h).cloned() {
            for v in bp {
                if v != h {
                    backpreds_h.insert(*rep.get(&scc_uf.find(v)).unwrap_or_else(|| bug!("missing rep for {v:?}")));
                } else {
                    is_scc = true;
                }
                succ_table.insert(v, (h, false));
            }
        }
        if !backpreds_h.is_empty() {
            is_scc = true;
        }

        let mut nested_sccs_h: HashSet<G::Node> = backpreds_h.clone();
        let mut worklist: Vec<G::Node> = backpreds_h.iter().copied().collect();
        while let Some(v) = worklist.pop() {
            if let Some(preds) = non_back_preds.get(&v).cloned() {
                for p in preds {
                    let rep_p = *rep.get(&scc_uf.find(p)).unwrap_or_else(|| bug!("missing rep for {p:?}"));
                    if rep_p != h && !nested_sccs_h.contains(&rep_p) {
                        nested_sccs_h.insert(rep_p);
                        worklist.push(rep_p);
                    }
                }
            }
        }

        if !is_scc {
            comp_table.insert(h, Component::Vertex(h));
            set_call_check(h, &mut has_check, &mut calls);
            continue;
        }

        set_call_check(h, &mut has_check, &mut calls);
        is_head.insert(h);
        is_in_loop.insert(h);

        let mut posts: Vec<(u32, G::Node)> = nested_sccs_h
            .iter()
            .map(|&v| (*post_dfn.get(&v).unwrap_or_else(|| bug!("missing post_dfn for {v:?}")), v))
            .collect();
        posts.sort_by(|a, b| b.0.cmp(&a.0));

        let mut partition: Vec<Component<G::Node>> = Vec::new();
        for &(_, v) in &posts {
            partition.push(comp_table.remove(&v).unwrap_or_else(|| bug!("missing component for {v:?}")));

            if let Some(preds) = non_back_preds.get(&v).cloned() {
                for u in preds {
                    if backpreds_h.contains(&u) {
                        continue;
                    }
                    succ_table.insert(u, (v, is_head.contains(&v)));

                    let u_outermost = *rep.get(&scc_uf.find(u)).unwrap_or_else(|| bug!("missing rep for {u:?}"));
                    if u != h && is_head.contains(&u_outermost) {
                        let mut head = if is_head.contains(&u) { u } else { *parent.get(&u).unwrap_or_else(|| bug!("missing parent for {u:?}")) };
                        while head != u_outermost {
                            children_with_post.entry(head).or_default().insert(u);
                            head = *parent.get(&head).unwrap_or_else(|| bug!("missing parent for {head:?}"));
                        }
                        children_with_post.entry(head).or_default().insert(u);
                    }
                }
            }
        }
        comp_table.insert(h, Component::Cycle(h, partition));

        for &v in &nested_sccs_h {
            scc_uf.union(v, h);
            let r = scc_uf.find(v);
            rep.insert(r, h);
            parent.insert(v, h);
            if !is_head.contains(&v) {
                is_in_loop.insert(v);
            }
        }
    }

    // ---- Pass 3: top-level assembly ----
    let mut is_outermost_component: HashSet<G::Node> = HashSet::new();
    let mut top_posts: Vec<(u32, G::Node)> = Vec::new();
    for &v in &order {
        let r = scc_uf.find(v);
        if *rep.get(&r).unwrap_or_else(|| bug!("missing rep for {v:?}")) == v {
            if is_head.contains(&v) {
                is_outermost_component.insert(v);
            }
            parent.insert(v, v);
            top_posts.push((*post_dfn.get(&v).unwrap_or_else(|| bug!("missing post_dfn for {v:?}")), v));
        }
    }
    top_posts.sort_by(|a, b| b.0.cmp(&a.0));

    let mut components: Vec<Component<G::Node>> = Vec::new();
    for &(_, v) in &top_posts {
        components.push(comp_table.remove(&v).unwrap_or_else(|| bug!("missing component for {v:?}")));

        if let Some(preds) = non_back_preds.get(&v).cloned() {
            for u in preds {
                succ_table.insert(u, (v, is_head.contains(&v)));

                let u_outermost = *rep.get(&scc_uf.find(u)).unwrap_or_else(|| bug!("missing rep for {u:?}"));
                if is_head.contains(&u_outermost) {
                    let mut head = if is_head.contains(&u) { u } else { *parent.get(&u).unwrap_or_else(|| bug!("missing parent for {u:?}")) };
                    while head != u_outermost {
                        children_with_post.entry(head).or_default().insert(u);
                        head = *parent.get(&head).unwrap_or_else(|| bug!("missing parent for {head:?}"));
                    }
                    children_with_post.entry(head).or_default().insert(u);
                }
            }
        }
    }

    // ---- Pass 4: liveness metadata ----
    let mut component_predecessors: HashMap<G::Node, HashSet<G::Node>> = HashMap::new();
    let mut last_user: HashMap<G::Node, G::Node> = HashMap::new();
    for (&u, &(v, is_comp_pred)) in &succ_table {
        if is_comp_pred {
            component_predecessors.entry(v).or_default().insert(u);
        } else {
            last_user.insert(u, v);
        }
    }

    // Cycle heads are excluded from their own `children_with_checks`: walking starts from
    // `parent[c]`, never from `c` itself, even when `c` is a head.
    let mut children_with_checks: HashMap<G::Node, HashSet<G::Node>> = HashMap::new();
    for &c in &has_check {
        let mut prev = c;
        let mut head = *parent.get(&c).unwrap_or_else(|| bug!("missing parent for {c:?}"));
        while head != prev {
            children_with_checks.entry(head).or_default().insert(c);
            prev = head;
            head = *parent.get(&head).unwrap_or_else(|| bug!("missing parent for {head:?}"));
        }
    }

    // Call-bearing heads DO see themselves in their own `children_with_calls`, unlike checks —
    // deferred checks inside an inlined callee reached from this head's own call statements must
    // still be discoverable while walking the head's own subtree.
    let mut children_with_calls: HashMap<G::Node, HashSet<G::Node>> = HashMap::new();
    for &c in &calls {
        let mut prev: Option<G::Node> = None;
        let mut head = if is_head.contains(&c) { c } else { *parent.get(&c).unwrap_or_else(|| bug!("missing parent for {c:?}")) };
        while Some(head) != prev {
            children_with_calls.entry(head).or_default().insert(c);
            prev = Some(head);
            head = *parent.get(&head).unwrap_or_else(|| bug!("missing parent for {head:?}"));
        }
    }

    let mut nesting: HashMap<G::Node, Vec<G::Node>> = HashMap::new();
    for &n in &order {
        let mut result = Vec::new();
        let mut prev = n;
        let mut cur = *parent.get(&n).unwrap_or_else(|| bug!("missing parent for {n:?}"));
        while cur != prev {
            result.push(cur);
            prev = cur;
            cur = *parent.get(&cur).unwrap_or_else(|| bug!("missing parent for {cur:?}"));
        }
        nesting.insert(n, result);
    }

    let meta = WtoMetadata {
        post_dfn,
        last_user,
        component_predecessors,
        children_with_checks,
        children_with_post,
        children_with_calls,
        has_check,
        is_in_loop,
        is_outermost_component,
        nesting,
    };

    Ok(Wto { components, meta })
}
