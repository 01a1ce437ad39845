use std::collections::HashMap;

use crate::cfg::Cfg;
use crate::checker::{Checker, CheckerSet};
use crate::wto::{Component, Wto};

/// A minimal CFG keyed on `u32` node ids, built from an adjacency list. Good enough to exercise
/// the builder's edge classification without dragging in `fixpoint-engine`'s toy CFG.
struct TestCfg {
    entry: u32,
    edges: HashMap<u32, Vec<u32>>,
    nodes: Vec<u32>,
}

impl TestCfg {
    fn new(entry: u32, edges: &[(u32, u32)]) -> Self {
        let mut adj: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut nodes = std::collections::BTreeSet::new();
        nodes.insert(entry);
        for &(a, b) in edges {
            adj.entry(a).or_default().push(b);
            nodes.insert(a);
            nodes.insert(b);
        }
        Self { entry, edges: adj, nodes: nodes.into_iter().collect() }
    }
}

impl Cfg for TestCfg {
    type Node = u32;
    type Stmt = ();
    type Call = ();

    fn entry(&self) -> u32 {
        self.entry
    }

    fn exits(&self) -> Vec<u32> {
        self.nodes.iter().copied().filter(|n| self.edges.get(n).map_or(true, |s| s.is_empty())).collect()
    }

    fn nodes(&self) -> Vec<u32> {
        self.nodes.clone()
    }

    fn successors(&self, n: u32) -> Vec<u32> {
        self.edges.get(&n).cloned().unwrap_or_default()
    }

    fn predecessors(&self, n: u32) -> Vec<u32> {
        self.edges.iter().filter(|(_, succs)| succs.contains(&n)).map(|(&p, _)| p).collect()
    }

    fn statements(&self, _n: u32) -> &[()] {
        &[]
    }

    fn as_call(_stmt: &()) -> Option<&()> {
        None
    }
}

struct NoChecks;
impl Checker<TestCfg, (), ()> for NoChecks {
    fn has_check(&self, _stmt: &()) -> bool {
        false
    }
    fn check(&self, _stmt: &(), _value: &(), _ctx: &()) {}
}

fn build(entry: u32, edges: &[(u32, u32)]) -> Wto<u32> {
    let cfg = TestCfg::new(entry, edges);
    let no_checks = NoChecks;
    let checkers = CheckerSet::new(vec![&no_checks]);
    Wto::build(&cfg, &checkers).expect("well-formed test graph")
}

#[test]
fn single_block_is_a_bare_vertex() {
    let wto = build(0, &[]);
    assert_eq!(wto.components().len(), 1);
    assert!(matches!(wto.components()[0], Component::Vertex(0)));
    assert!(!wto.is_in_loop(0));
}

#[test]
fn self_loop_on_entry_is_a_single_node_cycle() {
    // 0 -> 0
    let wto = build(0, &[(0, 0)]);
    assert_eq!(wto.components().len(), 1);
    match &wto.components()[0] {
        Component::Cycle(head, nested) => {
            assert_eq!(*head, 0);
            assert!(nested.is_empty());
        }
        Component::Vertex(_) => panic!("expected a cycle"),
    }
    assert!(wto.is_in_loop(0));
    assert!(wto.is_outermost_component(0));
}

#[test]
fn straight_line_diamond_has_no_cycles() {
    //   0
    //  / \
    // 1   2
    //  \ /
    //   3
    let wto = build(0, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
    assert_eq!(wto.components().len(), 1);
    assert!(matches!(wto.components()[0], Component::Vertex(0)));
    for n in [0, 1, 2, 3] {
        assert!(!wto.is_in_loop(n));
    }
    // 3 has two predecessors; one is last_user, the other falls out as the other's last_user too
    // since neither edge is a back edge, both just drain into 3 directly.
    assert_eq!(wto.last_user(1), Some(3));
    assert_eq!(wto.last_user(2), Some(3));
}

#[test]
fn natural_loop_nests_the_body_under_its_head() {
    // 0 -> 1 -> 2 -> 1 (back edge), 2 -> 3
    let wto = build(0, &[(0, 1), (1, 2), (2, 1), (2, 3)]);
    assert!(wto.is_in_loop(1));
    assert!(wto.is_in_loop(2));
    assert!(!wto.is_in_loop(0));
    assert!(!wto.is_in_loop(3));
    assert_eq!(wto.nesting_of(2), &[1]);
    assert!(wto.nesting_of(0).is_empty());
    assert_eq!(wto.component_predecessors(1).map(|s| s.len()), Some(1));
    assert!(wto.component_predecessors(1).unwrap().contains(&2));
}

#[test]
fn unreachable_node_is_rejected() {
    struct Disconnected;
    impl Cfg for Disconnected {
        type Node = u32;
        type Stmt = ();
        type Call = ();
        fn entry(&self) -> u32 {
            0
        }
        fn exits(&self) -> Vec<u32> {
            vec![0, 1]
        }
        fn nodes(&self) -> Vec<u32> {
            vec![0, 1]
        }
        fn successors(&self, _n: u32) -> Vec<u32> {
            vec![]
        }
        fn predecessors(&self, _n: u32) -> Vec<u32> {
            vec![]
        }
        fn statements(&self, _n: u32) -> &[()] {
            &[]
        }
        fn as_call(_stmt: &()) -> Option<&()> {
            None
        }
    }

    let cfg = Disconnected;
    let checkers: CheckerSet<'_, Disconnected, (), ()> = CheckerSet::new(vec![]);
    let result = Wto::<u32>::build(&cfg, &checkers);
    assert!(result.is_err());
}

#[test]
fn component_structure_is_deterministic_across_rebuilds() {
    let edges = [(0, 1), (1, 2), (2, 1), (2, 3), (3, 4), (4, 3), (4, 5)];
    let a = build(0, &edges);
    let b = build(0, &edges);
    assert_eq!(a.components(), b.components());
}
