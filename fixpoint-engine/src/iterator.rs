//! Interleaved forward fixpoint iterator: walks a `Wto` node by node, widening a cycle while it
//! grows and narrowing it back down once it stops, folding the classic `WtoIterator`/
//! `WtoProcessor` double-dispatch visitor into a single pass since `Wto` exposes `components()`
//! directly.

use std::hash::Hash;

use fixpoint_core::{AbstractValue, Cfg, Component, FixpointParameters, NarrowingStrategy, Wto, WideningStrategy};

use crate::invariant_table::{InvariantTable, Invariants};
use crate::listener::IterationListener;
use crate::state::FixpointIterationKind;

/// The callbacks a concrete function fixpoint supplies around the generic WTO walk: how to run a
/// block, how to run an edge, and what to do with a node's final pre/post invariant.
///
/// The methods a per-function fixpoint overrides on top of the generic iterator below.
pub trait FixpointCallbacks<G: Cfg, V: AbstractValue> {
    /// Runs `node`'s statements starting from `pre`, returning the post invariant.
    ///
    /// `defer_checks` is true when checks inside `node` must be recorded rather than run
    /// immediately (we are inside a loop, or a caller above us asked us to defer). `cache_calls`
    /// is true when this node's resolved callees must be kept alive afterwards for deferred-check
    /// replay.
    fn analyze_node(&mut self, node: G::Node, pre: V, defer_checks: bool, cache_calls: bool) -> V;

    /// Propagates `pre` across the edge `src -> dest` (e.g. applying edge-guard refinements).
    fn analyze_edge(&mut self, src: G::Node, dest: G::Node, pre: V) -> V;

    fn process_pre(&mut self, _node: G::Node, _pre: &V) {}
    fn process_post(&mut self, _node: G::Node, _post: &V) {}

    /// Replays checks recorded for `head`'s whole nested component, now that its invariants are
    /// final. Called once, only for the outermost component, only when checks were deferred.
    fn run_deferred_checks_in_component(&mut self, _head: G::Node, _wto: &Wto<G::Node>, _invariants: &mut Invariants<'_, G::Node, V>) {}

    /// Drops anything cached purely to support deferred-check replay for a cycle iteration that
    /// turned out not to be the final one.
    fn erase_values_cached_for_deferred_checks(&mut self, _head: G::Node, _wto: &Wto<G::Node>, _invariants: &mut Invariants<'_, G::Node, V>) {}
}

/// Drives a WTO to a fixpoint over an abstract domain `V`, delegating block/edge semantics to a
/// [`FixpointCallbacks`] implementor.
pub struct FixpointIterator<'a, G: Cfg, V: AbstractValue> {
    cfg: &'a G,
    wto: &'a Wto<G::Node>,
    pre: InvariantTable<G::Node, V>,
    post: InvariantTable<G::Node, V>,
    defer_checks: bool,
    exit: Option<G::Node>,
    bottom: V,
    params: &'a FixpointParameters<G::Node, V::Threshold>,
}

impl<'a, G: Cfg, V: AbstractValue> FixpointIterator<'a, G, V>
where
    G::Node: Eq + Hash,
{
    pub fn new(
        cfg: &'a G,
        wto: &'a Wto<G::Node>,
        defer_checks: bool,
        params: &'a FixpointParameters<G::Node, V::Threshold>,
    ) -> Self {
        let exit = cfg.exits().into_iter().next();
        Self {
            cfg,
            wto,
            pre: InvariantTable::new(),
            post: InvariantTable::new(),
            defer_checks,
            exit,
            bottom: V::bottom(),
            params,
        }
    }

    fn set_post(&mut self, node: G::Node, value: V) {
        let has_successors = !self.cfg.successors(node).is_empty();
        if !has_successors && Some(node) != self.exit {
            return;
        }
        self.post.set(node, value);
    }

    fn extrapolate(&self, head: G::Node, iteration: u32, before: &V, after: &V) -> V {
        // The first `widening_delay` iterations always plain-join; widening then kicks in at
        // iteration `widening_delay + 1` and every `widening_period`-th iteration after that.
        let widen_start = self.params.widening_delay + 1;
        let on_widen_step = iteration >= widen_start && (iteration - widen_start) % self.params.widening_period.max(1) == 0;

        match self.params.widening_strategy {
            WideningStrategy::Join => before.join_iter(after),
            WideningStrategy::Widen if !on_widen_step => before.join_iter(after),
            // The threshold only ever substitutes on the first post-delay widen step; every
            // later widen step plain-widens even with a threshold configured.
            WideningStrategy::Widen if iteration == widen_start => match self.params.threshold_for(&head) {
                Some(t) => before.widening_threshold(after, t),
                None => before.widening(after),
            },
            WideningStrategy::Widen => before.widening(after),
        }
    }

    fn refine(&self, head: G::Node, iteration: u32, before: &V, after: &V) -> V {
        match self.params.narrowing_strategy {
            NarrowingStrategy::Meet => before.meet(after),
            NarrowingStrategy::Narrow => {
                if iteration == 1 {
                    if let Some(t) = self.params.threshold_for(&head) {
                        return before.narrowing_threshold(after, t);
                    }
                }
                before.narrowing(after)
            }
        }
    }

    /// Computes the fixpoint starting from `init` at the CFG's entry, calling back into `cb` for
    /// every block and edge, then runs a final processing pass over every node's final pre/post.
    pub fn run<C>(&mut self, init: V, cb: &mut C, listener: &dyn IterationListener<G::Node>)
    where
        C: FixpointCallbacks<G, V>,
    {
        let entry = self.cfg.entry();
        self.pre.set(entry, init);

        for component in self.wto.components().to_vec() {
            self.visit(&component, cb, listener);
        }

        for component in self.wto.components().to_vec() {
            self.process(&component, cb);
        }

        if let Some(exit) = self.exit {
            self.post.erase(exit);
        }

        assert!(self.defer_checks || self.pre.is_empty(), "pre-invariants leaked past a non-deferred run");
        assert!(self.post.is_empty(), "post-invariants leaked past a run");
    }

    /// Consumes the iterator's pre-invariant table. Non-empty only after a deferred run, whose
    /// caller must hold onto these entries until it can replay the checks that were recorded
    /// against them.
    pub(crate) fn take_pre(self) -> InvariantTable<G::Node, V> {
        self.pre
    }

    fn visit<C>(&mut self, component: &Component<G::Node>, cb: &mut C, listener: &dyn IterationListener<G::Node>)
    where
        C: FixpointCallbacks<G, V>,
    {
        match component {
            Component::Vertex(node) => self.visit_vertex(*node, cb),
            Component::Cycle(head, nested) => self.visit_cycle(*head, nested, cb, listener),
        }
    }

    fn visit_vertex<C>(&mut self, node: G::Node, cb: &mut C)
    where
        C: FixpointCallbacks<G, V>,
    {
        let entry = self.cfg.entry();
        let mut pre = if node == entry {
            let v = self.pre.get(node, &self.bottom).clone();
            self.pre.erase(node);
            v
        } else {
            self.bottom.clone()
        };

        let is_in_loop = self.wto.is_in_loop(node);
        let defer_checks = self.defer_checks || is_in_loop;
        let cache_values = defer_checks && self.wto.has_check(node);

        for pred in self.cfg.predecessors(node) {
            let contributed = cb.analyze_edge(pred, node, self.post.get(pred, &self.bottom).clone());
            pre = pre.join(&contributed);

            if self.wto.last_user(pred) == Some(node) {
                self.post.erase(pred);
            }
        }

        if cache_values {
            self.pre.set(node, pre.clone());
        }

        let post = cb.analyze_node(node, pre, defer_checks, cache_values);
        self.set_post(node, post);
    }

    fn visit_cycle<C>(&mut self, head: G::Node, nested: &[Component<G::Node>], cb: &mut C, listener: &dyn IterationListener<G::Node>)
    where
        C: FixpointCallbacks<G, V>,
    {
        listener.notify_enter_cycle(head);

        let mut pre = self.bottom.clone();
        for pred in self.cfg.predecessors(head) {
            if self.wto.is_from_outside(head, pred) {
                let contributed = cb.analyze_edge(pred, head, self.post.get(pred, &self.bottom).clone());
                pre = pre.join(&contributed);
            }
        }

        let mut kind = FixpointIterationKind::Outside;
        // Entering the cycle transitions straight into the first increasing iteration.
        kind = FixpointIterationKind::Increasing(1);
        loop {
            let iteration = match kind {
                FixpointIterationKind::Increasing(k) | FixpointIterationKind::Decreasing(k) => k,
                FixpointIterationKind::Outside | FixpointIterationKind::Stable => {
                    unreachable!("visit_cycle's loop body only ever runs in an Increasing or Decreasing state")
                }
            };
            listener.notify_cycle_iteration(head, iteration, kind);

            let cache_calls = self.wto.has_check(head);
            let post = cb.analyze_node(head, pre.clone(), true, cache_calls);
            self.set_post(head, post);

            for component in nested {
                self.visit(component, cb, listener);
            }

            let mut new_pre_in = self.bottom.clone();
            let mut new_pre_back = self.bottom.clone();
            for pred in self.cfg.predecessors(head) {
                let contributed = cb.analyze_edge(pred, head, self.post.get(pred, &self.bottom).clone());
                if self.wto.is_from_outside(head, pred) {
                    new_pre_in = new_pre_in.join(&contributed);
                } else {
                    if self.wto.last_user(pred) == Some(head) {
                        self.post.erase(pred);
                    }
                    new_pre_back = new_pre_back.join(&contributed);
                }
            }
            let new_pre = new_pre_in.join_on_loop_entry(&new_pre_back);

            match kind {
                FixpointIterationKind::Increasing(k) => {
                    let candidate = self.extrapolate(head, k, &pre, &new_pre);
                    if candidate.leq(&pre) {
                        kind = FixpointIterationKind::Decreasing(1);
                    } else {
                        pre = candidate;
                        let mut inv = Invariants { pre: &mut self.pre, post: &mut self.post, bottom: &self.bottom };
                        cb.erase_values_cached_for_deferred_checks(head, self.wto, &mut inv);
                        kind = FixpointIterationKind::Increasing(k + 1);
                    }
                }
                FixpointIterationKind::Decreasing(k) => {
                    let reached_limit = self
                        .params
                        .narrowing_iterations_limit
                        .is_some_and(|limit| k >= limit);
                    let candidate = self.refine(head, k, &pre, &new_pre);
                    if reached_limit || pre.leq(&candidate) {
                        if let Some(preds) = self.wto.component_predecessors(head) {
                            for &p in preds {
                                self.post.erase(p);
                            }
                        }
                        if self.wto.has_check(head) {
                            self.pre.set(head, candidate);
                        }
                        if !self.defer_checks && self.wto.is_outermost_component(head) {
                            let mut inv = Invariants { pre: &mut self.pre, post: &mut self.post, bottom: &self.bottom };
                            cb.run_deferred_checks_in_component(head, self.wto, &mut inv);
                        }
                        kind = FixpointIterationKind::Stable;
                        break;
                    } else {
                        pre = candidate;
                        let mut inv = Invariants { pre: &mut self.pre, post: &mut self.post, bottom: &self.bottom };
                        cb.erase_values_cached_for_deferred_checks(head, self.wto, &mut inv);
                        kind = FixpointIterationKind::Decreasing(k + 1);
                    }
                }
                FixpointIterationKind::Outside | FixpointIterationKind::Stable => {
                    unreachable!("visit_cycle's loop body only ever runs in an Increasing or Decreasing state")
                }
            }
        }

        debug_assert_eq!(kind, FixpointIterationKind::Stable);
        listener.notify_leave_cycle(head);
    }

    fn process<C>(&mut self, component: &Component<G::Node>, cb: &mut C)
    where
        C: FixpointCallbacks<G, V>,
    {
        let head = component.head();
        cb.process_pre(head, self.pre.get(head, &self.bottom));
        cb.process_post(head, self.post.get(head, &self.bottom));
        for nested in component.nested() {
            self.process(nested, cb);
        }
    }
}
