//! Weighted union-find with path compression, keyed directly on graph nodes.
//!
//! The builder runs two independent instances of this: one for the offline LCA computation over
//! cross/forward edges, and one for the bottom-up SCC condensation. Neither instance's
//! "representative" is semantically meaningful on its own — both passes keep a separate side
//! table (`ancestor`, `rep`) mapping a set's root to the node that actually matters.

use std::collections::HashMap;
use std::hash::Hash;

pub(crate) struct NodeUnionFind<N> {
    parent: HashMap<N, N>,
    rank: HashMap<N, u32>,
}

impl<N: Copy + Eq + Hash> NodeUnionFind<N> {
    pub(crate) fn new() -> Self {
        Self { parent: HashMap::new(), rank: HashMap::new() }
    }

    pub(crate) fn make_set(&mut self, n: N) {
        self.parent.entry(n).or_insert(n);
        self.rank.entry(n).or_insert(0);
    }

    pub(crate) fn find(&mut self, n: N) -> N {
        let parent = *self
            .parent
            .get(&n)
            .unwrap_or_else(|| crate::macros::bug!("find() on a node outside the union-find universe"));
        if parent == n {
            n
        } else {
            let root = self.find(parent);
            self.parent.insert(n, root);
            root
        }
    }

    pub(crate) fn union(&mut self, a: N, b: N) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let rank_a = *self.rank.get(&ra).unwrap_or(&0);
        let rank_b = *self.rank.get(&rb).unwrap_or(&0);
        if rank_a < rank_b {
            self.parent.insert(ra, rb);
        } else if rank_a > rank_b {
            self.parent.insert(rb, ra);
        } else {
            self.parent.insert(rb, ra);
            self.rank.insert(ra, rank_a + 1);
        }
    }
}
