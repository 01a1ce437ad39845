//! Weak topological order construction and query surface.

mod builder;
mod component;
mod metadata;
mod union_find;

#[cfg(test)]
mod tests;

use std::hash::Hash;

pub use component::Component;

use crate::cfg::Cfg;
use crate::checker::CheckerSet;
use crate::errors::WtoError;
use metadata::WtoMetadata;

/// A weak topological order over a [`Cfg`], plus the liveness and nesting metadata the fixpoint
/// iterator and call engine need to walk it.
#[derive(Debug)]
pub struct Wto<N: Eq + Hash> {
    components: Vec<Component<N>>,
    meta: WtoMetadata<N>,
}

impl<N: Copy + Eq + Hash + Ord + std::fmt::Debug> Wto<N> {
    /// Builds a WTO for `cfg`. `checkers` is consulted once per statement to seed `has_check` and
    /// the `children_with_checks` index.
    pub fn build<G, V, Ctx>(cfg: &G, checkers: &CheckerSet<'_, G, V, Ctx>) -> Result<Self, WtoError>
    where
        G: Cfg<Node = N>,
    {
        builder::build(cfg, checkers)
    }

    /// The top-level components, in Bourdoncle order (descending post-DFN of each component's
    /// head).
    pub fn components(&self) -> &[Component<N>] {
        &self.components
    }

    pub fn post_dfn(&self, n: N) -> Option<u32> {
        self.meta.post_dfn.get(&n).copied()
    }

    /// True when the edge `pred -> head` is a DAG edge landing on `head` from outside the loop
    /// (`pred` is one of `head`'s `component_predecessors`), false when it is a back edge (`pred`
    /// is a loop-internal node whose post is evicted through `last_user` instead).
    pub fn is_from_outside(&self, head: N, pred: N) -> bool {
        self.meta.component_predecessors.get(&head).is_some_and(|preds| preds.contains(&pred))
    }

    /// The single successor whose predecessor-set `pred` belongs to when `pred` is not a
    /// component predecessor — the node after which `pred`'s invariant can be evicted from the
    /// pre-state table.
    pub fn last_user(&self, pred: N) -> Option<N> {
        self.meta.last_user.get(&pred).copied()
    }

    /// Predecessors of `head` that feed it from outside the loop (a DAG edge landing on the
    /// head) — read once before the cycle starts and again at every iteration, never evicted
    /// until the cycle itself stabilizes.
    pub fn component_predecessors(&self, head: N) -> Option<&std::collections::HashSet<N>> {
        self.meta.component_predecessors.get(&head)
    }

    /// Descendants of `head` (inclusive of nested heads, exclusive of `head` itself) carrying at
    /// least one checked statement.
    pub fn children_with_checks(&self, head: N) -> Option<&std::collections::HashSet<N>> {
        self.meta.children_with_checks.get(&head)
    }

    pub fn children_with_post(&self, head: N) -> Option<&std::collections::HashSet<N>> {
        self.meta.children_with_post.get(&head)
    }

    /// Descendants of `head` (inclusive of `head` itself, when `head` carries a call) carrying at
    /// least one call statement.
    pub fn children_with_calls(&self, head: N) -> Option<&std::collections::HashSet<N>> {
        self.meta.children_with_calls.get(&head)
    }

    pub fn has_check(&self, n: N) -> bool {
        self.meta.has_check.contains(&n)
    }

    pub fn is_in_loop(&self, n: N) -> bool {
        self.meta.is_in_loop.contains(&n)
    }

    pub fn is_outermost_component(&self, n: N) -> bool {
        self.meta.is_outermost_component.contains(&n)
    }

    /// The chain of cycle heads strictly enclosing `n`, innermost first.
    /// Empty for a node outside any loop.
    pub fn nesting_of(&self, n: N) -> &[N] {
        self.meta.nesting.get(&n).map(Vec::as_slice).unwrap_or(&[])
    }
}
