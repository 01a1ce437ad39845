//! Per-WTO liveness and nesting metadata.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Default)]
pub(crate) struct WtoMetadata<N: Eq + Hash> {
    pub(crate) post_dfn: HashMap<N, u32>,
    pub(crate) last_user: HashMap<N, N>,
    pub(crate) component_predecessors: HashMap<N, HashSet<N>>,
    pub(crate) children_with_checks: HashMap<N, HashSet<N>>,
    pub(crate) children_with_post: HashMap<N, HashSet<N>>,
    pub(crate) children_with_calls: HashMap<N, HashSet<N>>,
    pub(crate) has_check: HashSet<N>,
    pub(crate) is_in_loop: HashSet<N>,
    pub(crate) is_outermost_component: HashSet<N>,
    /// Innermost-first list of cycle heads strictly enclosing a node.
    pub(crate) nesting: HashMap<N, Vec<N>>,
}
