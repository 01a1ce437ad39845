//! Construction-time errors: small, local, constructor-rejected conditions. The richer,
//! context-carrying errors a running engine produces live in `fixpoint-engine::errors`, one layer
//! up.

/// Raised while building a [`crate::wto::Wto`] from a malformed control-flow graph.
///
/// A CFG with no entry, or whose entry is unreachable from itself through the node set the
/// caller supplied, cannot be condensed into a weak topological order. This is treated by callers
/// as a programming error: the only in-tree caller (`fixpoint-engine`'s function fixpoint)
/// immediately unwraps it with a descriptive message rather than propagating it further.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WtoError {
    #[error("control-flow graph for entry node {entry:?} has no nodes")]
    EmptyGraph { entry: String },

    #[error("node {node:?} is unreachable from the entry {entry:?}")]
    UnreachableNode { entry: String, node: String },
}
