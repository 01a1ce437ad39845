//! Tuning knobs a caller supplies to a function fixpoint: widening/narrowing strategy, delay and
//! period, and per-head thresholds.

use std::collections::HashMap;
use std::hash::Hash;

/// Extrapolation policy applied while a cycle is still increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WideningStrategy {
    /// Plain `join` until the widening delay elapses, then `widening` (or `widening_threshold`
    /// for the first post-delay iteration, if a threshold is registered for the head).
    #[default]
    Widen,
    /// Never widen; extrapolate with repeated `join` instead. Useful for domains of finite
    /// height where widening would lose precision for nothing.
    Join,
}

/// Refinement policy applied once the increasing phase reaches a post-fixpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrowingStrategy {
    #[default]
    Narrow,
    Meet,
}

/// Per-function fixpoint tuning knobs.
#[derive(Debug, Clone)]
pub struct FixpointParameters<N, T> {
    pub widening_strategy: WideningStrategy,
    pub narrowing_strategy: NarrowingStrategy,
    /// Number of increasing iterations to run with plain `join` before widening kicks in.
    pub widening_delay: u32,
    /// Widen only every `widening_period`-th iteration past the delay; must be at least 1.
    pub widening_period: u32,
    /// Optional cap on narrowing iterations; `None` means narrow until `leq` holds.
    pub narrowing_iterations_limit: Option<u32>,
    thresholds: HashMap<N, T>,
}

impl<N: Eq + Hash, T> FixpointParameters<N, T> {
    pub fn new(widening_delay: u32, widening_period: u32) -> Self {
        assert!(widening_period >= 1, "widening_period must be at least 1");
        Self {
            widening_strategy: WideningStrategy::default(),
            narrowing_strategy: NarrowingStrategy::default(),
            widening_delay,
            widening_period,
            narrowing_iterations_limit: None,
            thresholds: HashMap::new(),
        }
    }

    pub fn with_threshold(mut self, head: N, threshold: T) -> Self {
        self.thresholds.insert(head, threshold);
        self
    }

    pub fn threshold_for(&self, head: &N) -> Option<&T> {
        self.thresholds.get(head)
    }
}

impl<N: Eq + Hash, T> Default for FixpointParameters<N, T> {
    fn default() -> Self {
        Self::new(0, 1)
    }
}
