//! The abstract-domain contract, consumed but never implemented by this crate.
//!
//! Every lattice operation the iterator and the call engine rely on is listed here. The concrete
//! domain (intervals, points-to sets, whatever the analyzer is built around) lives entirely
//! outside this crate; `fixpoint-engine::testing` provides a toy interval domain purely so this
//! workspace's own test suite has something concrete to run the iterator against.

/// A lattice element representing a (possibly infinite) set of concrete program states.
///
/// Values are moved, not shared: the core never retains two aliases of the same `AbstractValue`.
/// Implementors are free to be `Clone` for convenience in tests and error messages, but the
/// fixpoint core itself never clones a table entry to read it twice — it reads by reference or
/// consumes by value, never both.
pub trait AbstractValue: Clone {
    /// Caller-supplied threshold used by `widening_threshold` / `narrowing_threshold` to jump
    /// straight to a known bound instead of iterating up to it one widening step at a time.
    type Threshold;

    fn bottom() -> Self;
    fn is_bottom(&self) -> bool;

    fn leq(&self, other: &Self) -> bool;

    fn join(&self, other: &Self) -> Self;

    /// A possibly more aggressive join used only inside the increasing iteration sequence.
    /// Domains that have no cheaper over-approximation than plain `join` can default to it.
    fn join_iter(&self, other: &Self) -> Self {
        self.join(other)
    }

    /// Join used specifically when computing a cycle head's pre-invariant from its back-edge
    /// predecessors versus its outside predecessors.
    fn join_on_loop_entry(&self, back: &Self) -> Self {
        self.join(back)
    }

    fn meet(&self, other: &Self) -> Self;

    fn widening(&self, other: &Self) -> Self;
    fn widening_threshold(&self, other: &Self, threshold: &Self::Threshold) -> Self;

    fn narrowing(&self, other: &Self) -> Self;
    fn narrowing_threshold(&self, other: &Self, threshold: &Self::Threshold) -> Self;

    /// Normal/exception-flow splitters, used by the call engine when masking and restoring
    /// caller exceptions around a callee dispatch.
    fn set_normal_flow_to_bottom(&mut self);
    fn is_normal_flow_bottom(&self) -> bool;
    fn ignore_exceptions(&self) -> Self;
    fn merge_caught_in_propagated_exceptions(&mut self);
    fn merge_propagated_in_caught_exceptions(&mut self);
}
