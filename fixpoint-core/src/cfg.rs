//! The control-flow-graph contract, read-only from the core's point of view.

use core::fmt::Debug;
use core::hash::Hash;

/// A control-flow graph of one function: a directed graph of basic blocks with a designated
/// entry and zero or more exits.
///
/// The core never mutates a `Cfg` and never inspects a statement's payload beyond asking whether
/// it is a call (`as_call`) — everything else about a statement's meaning belongs to the
/// numerical engine and the checkers.
pub trait Cfg {
    /// Opaque identity of a basic block. Implementations typically use a small `Copy` index type.
    type Node: Copy + Eq + Hash + Ord + Debug;

    /// Opaque identity of a statement within a block.
    type Stmt: Clone + Debug;

    /// Opaque identity of a call statement, distinct from `Stmt` so the call engine and the call
    /// cache can use it as a map key without re-deriving it from a `Stmt` on every lookup.
    type Call: Clone + Debug + Eq + Hash;

    fn entry(&self) -> Self::Node;

    /// Zero or more exit blocks. The WTO builder handles the exit-less degenerate case.
    fn exits(&self) -> Vec<Self::Node>;

    fn nodes(&self) -> Vec<Self::Node>;

    fn successors(&self, n: Self::Node) -> Vec<Self::Node>;
    fn predecessors(&self, n: Self::Node) -> Vec<Self::Node>;

    fn statements(&self, n: Self::Node) -> &[Self::Stmt];

    /// Classifies a statement as a call, if it is one. A free function rather than a method on
    /// `Stmt` itself, since `Stmt` is a plain associated type with no required trait bound beyond
    /// `Clone + Debug`.
    fn as_call(stmt: &Self::Stmt) -> Option<&Self::Call>;
}
