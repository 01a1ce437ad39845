//! Iteration observers: hooks fired on cycle entry, each iteration, and cycle stabilization, plus
//! a `tracing`-backed implementation that instruments the hot loop with spans rather than bespoke
//! logging.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

use crate::state::FixpointIterationKind;

/// Hooks into the cycle-iteration lifecycle. Every method has a no-op default so an analyzer only
/// overrides what it needs.
pub trait IterationListener<N> {
    fn notify_enter_cycle(&self, _head: N) {}
    fn notify_cycle_iteration(&self, _head: N, _iteration: u32, _kind: FixpointIterationKind) {}
    fn notify_leave_cycle(&self, _head: N) {}
}

/// The default listener: observes nothing.
pub struct NoOpListener;

impl<N> IterationListener<N> for NoOpListener {}

/// Emits a `tracing` span per cycle and a debug event per iteration, and keeps a running count of
/// iterations spent per head, surfaced for tests and diagnostics that want to assert convergence
/// speed without re-instrumenting the iterator.
#[derive(Default)]
pub struct TracingIterationListener<N: Eq + Hash> {
    counts: RefCell<HashMap<N, u32>>,
}

impl<N: Eq + Hash + Copy + std::fmt::Debug> TracingIterationListener<N> {
    pub fn new() -> Self {
        Self { counts: RefCell::new(HashMap::new()) }
    }

    /// Total number of iterations (increasing + decreasing) spent stabilizing the cycle headed
    /// at `head`, across the whole run.
    pub fn iterations_at(&self, head: N) -> u32 {
        self.counts.borrow().get(&head).copied().unwrap_or(0)
    }
}

impl<N: Eq + Hash + Copy + std::fmt::Debug> IterationListener<N> for TracingIterationListener<N> {
    fn notify_enter_cycle(&self, head: N) {
        tracing::debug!(?head, "entering cycle");
    }

    fn notify_cycle_iteration(&self, head: N, iteration: u32, kind: FixpointIterationKind) {
        tracing::trace!(?head, iteration, ?kind, "cycle iteration");
        *self.counts.borrow_mut().entry(head).or_insert(0) += 1;
    }

    fn notify_leave_cycle(&self, head: N) {
        tracing::debug!(?head, "cycle stabilized");
    }
}
