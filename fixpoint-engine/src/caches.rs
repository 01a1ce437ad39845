//! Deferred-check replay caches: when checks are deferred, a callee's completed analysis is kept
//! alive at its call site so the checks inside it can be replayed later against the now-final
//! invariants, instead of re-running the whole callee.

use std::collections::HashMap;
use std::hash::Hash;

/// Per-block cache of `(callee, completed child analysis)` pairs, keyed by the basic block that
/// contains the call. A block can carry more than one call statement, and an indirect call can
/// resolve to more than one callee, so every combination that produced deferred checks is kept.
pub(crate) struct CalleeCache<N, Function, Child> {
    entries: HashMap<N, Vec<(Function, Child)>>,
}

impl<N: Eq + Hash, Function, Child> Default for CalleeCache<N, Function, Child> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<N: Eq + Hash + Copy, Function, Child> CalleeCache<N, Function, Child> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bb: N, callee: Function, child: Child) {
        self.entries.entry(bb).or_default().push((callee, child));
    }

    pub(crate) fn take(&mut self, bb: N) -> Vec<(Function, Child)> {
        self.entries.remove(&bb).unwrap_or_default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drains every cached child, per block. Used when a deferred run itself finishes and its
    /// own leftover callee cache must be handed to its replay, or discarded on a non-final
    /// cycle iteration.
    pub(crate) fn drain(&mut self) -> std::collections::hash_map::Drain<'_, N, Vec<(Function, Child)>> {
        self.entries.drain()
    }
}

/// Per-`(block, call)` cache of the invariant that held immediately after a call statement ran.
/// During deferred-check replay, a cached call is never re-executed — its post-invariant is
/// substituted directly, since re-running it would re-trigger (and possibly re-cache) callee
/// analyses for no benefit.
pub(crate) struct CallCache<N, Call, V> {
    entries: HashMap<N, HashMap<Call, V>>,
}

impl<N: Eq + Hash, Call, V> Default for CallCache<N, Call, V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<N: Eq + Hash + Copy, Call: Eq + Hash, V> CallCache<N, Call, V> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set(&mut self, bb: N, call: Call, value: V) {
        self.entries.entry(bb).or_default().insert(call, value);
    }

    pub(crate) fn take(&mut self, bb: N, call: &Call) -> Option<V> {
        self.entries.get_mut(&bb).and_then(|m| m.remove(call))
    }

    pub(crate) fn erase_block(&mut self, bb: N) {
        self.entries.remove(&bb);
    }
}
