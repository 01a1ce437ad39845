//! A minimal single-variable CFG and numerical engine, built only to give
//! [`super::interval::Interval`] somewhere to run. Real analyzers track an environment of many
//! variables; this toy tracks exactly one, which is all the iterator and call-engine tests need.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use fixpoint_core::{AbstractValue, CallTarget, Cfg, NumericalEngine, PointerOracle, PointsToSet};

use super::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Opaque handle to a pointer-valued variable, used only as an indirect call's operand — the toy
/// engine never tracks its value, since it defers entirely to [`ToyOracle`].
pub type Var = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToyCallTarget {
    Direct(FunctionId),
    Indirect(Var),
    Undefined,
    InlineAsm,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToyCall {
    pub id: u32,
    pub target: ToyCallTarget,
}

#[derive(Debug, Clone)]
pub enum ToyStmt {
    Assign(i64),
    Increment(i64),
    Havoc,
    Call(ToyCall),
}

/// A hand-built control-flow graph: nodes, edges and per-node statement lists, all supplied by
/// the test that constructs one.
#[derive(Debug, Default, Clone)]
pub struct ToyCfg {
    entry: Option<NodeId>,
    exits: Vec<NodeId>,
    nodes: Vec<NodeId>,
    succ: HashMap<NodeId, Vec<NodeId>>,
    pred: HashMap<NodeId, Vec<NodeId>>,
    stmts: HashMap<NodeId, Vec<ToyStmt>>,
}

impl ToyCfg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeId, stmts: Vec<ToyStmt>) -> &mut Self {
        if self.entry.is_none() {
            self.entry = Some(node);
        }
        self.nodes.push(node);
        self.stmts.insert(node, stmts);
        self.succ.entry(node).or_default();
        self.pred.entry(node).or_default();
        self
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        self.succ.entry(from).or_default().push(to);
        self.pred.entry(to).or_default().push(from);
        self
    }

    pub fn set_exits(&mut self, exits: Vec<NodeId>) -> &mut Self {
        self.exits = exits;
        self
    }
}

impl Cfg for ToyCfg {
    type Node = NodeId;
    type Stmt = ToyStmt;
    type Call = ToyCall;

    fn entry(&self) -> NodeId {
        self.entry.expect("ToyCfg::add_node must be called before entry() is queried")
    }

    fn exits(&self) -> Vec<NodeId> {
        self.exits.clone()
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.nodes.clone()
    }

    fn successors(&self, n: NodeId) -> Vec<NodeId> {
        self.succ.get(&n).cloned().unwrap_or_default()
    }

    fn predecessors(&self, n: NodeId) -> Vec<NodeId> {
        self.pred.get(&n).cloned().unwrap_or_default()
    }

    fn statements(&self, n: NodeId) -> &[ToyStmt] {
        self.stmts.get(&n).map(Vec::as_slice).unwrap_or(&[])
    }

    fn as_call(stmt: &ToyStmt) -> Option<&ToyCall> {
        match stmt {
            ToyStmt::Call(call) => Some(call),
            _ => None,
        }
    }
}

/// Maps a pointer variable to the functions it may hold, standing in for a real points-to
/// analysis.
#[derive(Debug, Default, Clone)]
pub struct ToyOracle {
    table: HashMap<Var, Vec<FunctionId>>,
}

impl ToyOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, var: Var, targets: Vec<FunctionId>) -> &mut Self {
        self.table.insert(var, targets);
        self
    }
}

#[derive(Debug, Clone)]
pub enum ToyPointsToSet {
    Bottom,
    Top,
    Functions(Vec<FunctionId>),
}

impl PointsToSet<FunctionId> for ToyPointsToSet {
    fn bottom() -> Self {
        ToyPointsToSet::Bottom
    }

    fn top() -> Self {
        ToyPointsToSet::Top
    }

    fn is_bottom(&self) -> bool {
        matches!(self, ToyPointsToSet::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, ToyPointsToSet::Top)
    }

    fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (ToyPointsToSet::Bottom, _) | (_, ToyPointsToSet::Bottom) => ToyPointsToSet::Bottom,
            (ToyPointsToSet::Top, other) => other.clone(),
            (this, ToyPointsToSet::Top) => this.clone(),
            (ToyPointsToSet::Functions(a), ToyPointsToSet::Functions(b)) => {
                let allowed: HashSet<_> = b.iter().collect();
                let members: Vec<_> = a.iter().filter(|f| allowed.contains(f)).copied().collect();
                if members.is_empty() { ToyPointsToSet::Bottom } else { ToyPointsToSet::Functions(members) }
            }
        }
    }

    fn function_members(&self) -> Vec<FunctionId> {
        match self {
            ToyPointsToSet::Functions(members) => members.clone(),
            ToyPointsToSet::Bottom | ToyPointsToSet::Top => Vec::new(),
        }
    }
}

impl PointerOracle<Var, FunctionId> for ToyOracle {
    type Set = ToyPointsToSet;

    fn points_to(&self, var: &Var) -> Self::Set {
        self.table.get(var).cloned().map(ToyPointsToSet::Functions).unwrap_or(ToyPointsToSet::Top)
    }
}

/// The single-variable numerical engine. `oracle` and `externs` are shared (never mutated after
/// construction) across every `fork()`, matching `fork`'s role of handing a callee a copy of the
/// caller's immutable context.
#[derive(Clone)]
pub struct ToyEngine<'o> {
    inv: Interval,
    oracle: Option<&'o ToyOracle>,
    externs: Rc<HashSet<FunctionId>>,
    /// Per-edge increments, for tests that need a transfer function on an edge rather than
    /// inside a block (e.g. a loop's back edge incrementing a counter).
    edge_increments: Rc<HashMap<(NodeId, NodeId), i64>>,
}

impl<'o> ToyEngine<'o> {
    pub fn new(oracle: Option<&'o ToyOracle>, externs: HashSet<FunctionId>) -> Self {
        Self { inv: Interval::bottom(), oracle, externs: Rc::new(externs), edge_increments: Rc::new(HashMap::new()) }
    }

    pub fn with_edge_increments(mut self, edges: HashMap<(NodeId, NodeId), i64>) -> Self {
        self.edge_increments = Rc::new(edges);
        self
    }
}

impl<'o> NumericalEngine<ToyCfg> for ToyEngine<'o> {
    type Value = Interval;
    type Function = FunctionId;
    type Var = Var;
    type Oracle = ToyOracle;

    fn set_inv(&mut self, inv: Interval) {
        self.inv = inv;
    }

    fn inv(&self) -> &Interval {
        &self.inv
    }

    fn take_inv(&mut self) -> Interval {
        std::mem::replace(&mut self.inv, Interval::bottom())
    }

    fn exec_enter(&mut self, _bb: NodeId) {}
    fn exec_leave(&mut self, _bb: NodeId) {}

    fn exec_edge(&mut self, src: NodeId, dest: NodeId) {
        let Some(&delta) = self.edge_increments.get(&(src, dest)) else {
            return;
        };
        if let Some((lo, hi)) = self.inv.bounds() {
            self.inv = Interval::range(lo.saturating_add(delta), hi.saturating_add(delta));
        }
    }

    fn exec_stmt(&mut self, stmt: &ToyStmt) {
        match stmt {
            ToyStmt::Assign(v) => self.inv = Interval::point(*v),
            ToyStmt::Increment(delta) => {
                if let Some((lo, hi)) = self.inv.bounds() {
                    self.inv = Interval::range(lo.saturating_add(*delta), hi.saturating_add(*delta));
                }
            }
            ToyStmt::Havoc => self.inv = Interval::top(),
            ToyStmt::Call(_) => unreachable!("calls are dispatched through execute_call, never exec_stmt"),
        }
    }

    fn call_target(&self, call: &ToyCall) -> CallTarget<Var, FunctionId> {
        match call.target {
            ToyCallTarget::Direct(f) => CallTarget::Direct(f),
            ToyCallTarget::Indirect(var) => CallTarget::Indirect(var),
            ToyCallTarget::Undefined => CallTarget::Undefined,
            ToyCallTarget::InlineAsm => CallTarget::InlineAsm,
        }
    }

    fn points_to_from_value(&self, _var: Var) -> ToyPointsToSet {
        ToyPointsToSet::Top
    }

    fn assert_non_null(&mut self, _var: Var) {}

    fn is_function_typed(&self, _callee: FunctionId, _call: &ToyCall) -> bool {
        true
    }

    fn is_external(&self, callee: FunctionId) -> bool {
        self.externs.contains(&callee)
    }

    fn exec_extern_call(&mut self, _call: &ToyCall, _callee: FunctionId) {
        self.inv = Interval::top();
    }

    fn exec_unknown_extern_call(&mut self, _call: &ToyCall) {
        self.inv = Interval::top();
    }

    fn exec_unknown_intern_call(&mut self, _call: &ToyCall) {
        self.inv = Interval::top();
    }

    fn match_down(&mut self, _call: &ToyCall, _callee: FunctionId) {}

    fn match_up(&mut self, _call: &ToyCall, callee_exit: &Interval) {
        self.inv = callee_exit.clone();
    }

    fn deallocate_local_variables(&mut self, _function: FunctionId) {}

    fn fork(&self) -> Self {
        Self {
            inv: Interval::bottom(),
            oracle: self.oracle,
            externs: Rc::clone(&self.externs),
            edge_increments: Rc::clone(&self.edge_increments),
        }
    }

    fn pointer_info(&self) -> Option<&ToyOracle> {
        self.oracle
    }
}

/// Resolves a [`FunctionId`] to its CFG by lookup in a table built at test setup.
#[derive(Debug, Default)]
pub struct ToyResolver {
    functions: HashMap<FunctionId, ToyCfg>,
}

impl ToyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: FunctionId, cfg: ToyCfg) -> &mut Self {
        self.functions.insert(function, cfg);
        self
    }
}

impl crate::call_engine::CalleeResolver<ToyCfg, FunctionId> for ToyResolver {
    fn cfg_of(&self, function: FunctionId) -> Option<&ToyCfg> {
        self.functions.get(&function)
    }
}
