//! End-to-end scenarios run against the toy interval domain: each test builds a small hand-rolled
//! CFG and asserts the invariant the fixpoint settles on at the function's exit.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use fixpoint_core::{AbstractValue, Checker, CheckerSet, FixpointParameters};
use fixpoint_engine::testing::{
    FunctionId, Interval, NodeId, ToyCall, ToyCallTarget, ToyCfg, ToyEngine, ToyOracle, ToyResolver, ToyStmt,
};
use fixpoint_engine::{CallContextId, CallContextInterner, FunctionFixpoint, NoOpListener, TracingIterationListener};

/// A checker that records every invariant it is asked to check, gated by a caller-supplied
/// predicate over the statement. Lets each scenario decide which statements are "checked"
/// without a dedicated marker statement type.
struct RecordingChecker<F> {
    predicate: F,
    log: RefCell<Vec<(Interval, CallContextId)>>,
}

impl<F: Fn(&ToyStmt) -> bool> RecordingChecker<F> {
    fn new(predicate: F) -> Self {
        Self { predicate, log: RefCell::new(Vec::new()) }
    }

    fn recorded(&self) -> Vec<(Interval, CallContextId)> {
        self.log.borrow().clone()
    }
}

impl<F: Fn(&ToyStmt) -> bool> Checker<ToyCfg, Interval, CallContextId> for RecordingChecker<F> {
    fn has_check(&self, stmt: &ToyStmt) -> bool {
        (self.predicate)(stmt)
    }

    fn check(&self, _stmt: &ToyStmt, value: &Interval, ctx: &CallContextId) {
        self.log.borrow_mut().push((value.clone(), *ctx));
    }
}

/// S1: a straight-line CFG with no loops and no calls. `x = 5` then `x += 3` then a checked
/// no-op; the exit invariant should be the exact point `8`.
#[test]
fn linear_block_chain_propagates_a_point_value() {
    let a = NodeId(0);
    let b = NodeId(1);
    let c = NodeId(2);

    let mut cfg = ToyCfg::new();
    cfg.add_node(a, vec![ToyStmt::Assign(5)]);
    cfg.add_node(b, vec![ToyStmt::Increment(3)]);
    cfg.add_node(c, vec![ToyStmt::Increment(0)]);
    cfg.add_edge(a, b);
    cfg.add_edge(b, c);
    cfg.set_exits(vec![c]);

    let checker = RecordingChecker::new(|s| matches!(s, ToyStmt::Increment(0)));
    let checkers = CheckerSet::new(vec![&checker as &dyn Checker<ToyCfg, Interval, CallContextId>]);
    let params = FixpointParameters::<NodeId, (i64, i64)>::default();
    let resolver = ToyResolver::new();
    let call_contexts: RefCell<CallContextInterner<ToyCall, FunctionId>> = RefCell::new(CallContextInterner::new());
    let engine = ToyEngine::new(None, HashSet::new());

    let mut fixpoint = FunctionFixpoint::new_entry_point(
        &cfg,
        &checkers,
        &params,
        &resolver,
        &call_contexts,
        FunctionId(0),
        engine,
    );

    let exit = fixpoint.run(Interval::bottom(), false, &NoOpListener);
    assert_eq!(exit, Interval::point(8));

    let recorded = checker.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, Interval::point(8));
}

/// S2: a single loop (`B -> C -> B` with `B` the head, entered from outside through `A`) whose
/// back edge increments `x` without bound. Widening must still terminate the increasing phase in
/// a handful of iterations, and `B`'s deferred check (it sits inside the loop, so its check can't
/// run until the cycle is fully stable) must fire exactly once, against the widened value.
///
/// This is also the regression the `Wto::is_from_outside` polarity bug hid: with the polarity
/// inverted, `C`'s post-invariant is never evicted inside the cycle (it is misclassified as an
/// outside predecessor, so the back-edge eviction branch never runs for it), and the iterator's
/// own "no invariants leaked past a run" assertion would catch it.
#[test]
fn single_loop_widens_then_narrows_and_replays_its_deferred_check() {
    let a = NodeId(0);
    let b = NodeId(1);
    let c = NodeId(2);
    let d = NodeId(3);

    let mut cfg = ToyCfg::new();
    cfg.add_node(a, vec![ToyStmt::Assign(0)]);
    cfg.add_node(b, vec![ToyStmt::Increment(0)]);
    cfg.add_node(c, vec![]);
    cfg.add_node(d, vec![]);
    cfg.add_edge(a, b);
    cfg.add_edge(b, c);
    cfg.add_edge(c, b);
    cfg.add_edge(b, d);
    cfg.set_exits(vec![d]);

    let checker = RecordingChecker::new(|s| matches!(s, ToyStmt::Increment(0)));
    let checkers = CheckerSet::new(vec![&checker as &dyn Checker<ToyCfg, Interval, CallContextId>]);
    let params = FixpointParameters::<NodeId, (i64, i64)>::new(0, 1);
    let resolver = ToyResolver::new();
    let call_contexts: RefCell<CallContextInterner<ToyCall, FunctionId>> = RefCell::new(CallContextInterner::new());
    let mut edges = HashMap::new();
    edges.insert((c, b), 1);
    let engine = ToyEngine::new(None, HashSet::new()).with_edge_increments(edges);

    let mut fixpoint = FunctionFixpoint::new_entry_point(
        &cfg,
        &checkers,
        &params,
        &resolver,
        &call_contexts,
        FunctionId(0),
        engine,
    );

    let listener = TracingIterationListener::new();
    let exit = fixpoint.run(Interval::bottom(), false, &listener);

    assert_eq!(exit, Interval::range(0, i64::MAX));
    assert!(listener.iterations_at(b) >= 4, "widening should converge within a handful of iterations");

    let recorded = checker.recorded();
    assert_eq!(recorded.len(), 1, "B's check is inside the loop, so it must be deferred and replayed exactly once");
    assert_eq!(recorded[0].0, Interval::range(0, i64::MAX));
}

/// S3: a direct call. The caller's invariant after the call site is exactly the callee's exit
/// invariant, matched back in through `match_up`.
#[test]
fn direct_call_inlines_the_callees_exit_invariant() {
    let caller_entry = NodeId(0);
    let caller_exit = NodeId(1);
    let callee_fn = FunctionId(1);
    let callee_entry = NodeId(10);

    let mut caller = ToyCfg::new();
    caller.add_node(caller_entry, vec![ToyStmt::Call(ToyCall { id: 0, target: ToyCallTarget::Direct(callee_fn) })]);
    caller.add_node(caller_exit, vec![]);
    caller.add_edge(caller_entry, caller_exit);
    caller.set_exits(vec![caller_exit]);

    let mut callee = ToyCfg::new();
    callee.add_node(callee_entry, vec![ToyStmt::Assign(42)]);
    callee.set_exits(vec![callee_entry]);

    let mut resolver = ToyResolver::new();
    resolver.insert(callee_fn, callee);

    let checkers: CheckerSet<'_, ToyCfg, Interval, CallContextId> = CheckerSet::new(vec![]);
    let params = FixpointParameters::<NodeId, (i64, i64)>::default();
    let call_contexts: RefCell<CallContextInterner<ToyCall, FunctionId>> = RefCell::new(CallContextInterner::new());
    let engine = ToyEngine::new(None, HashSet::new());

    let mut fixpoint = FunctionFixpoint::new_entry_point(
        &caller,
        &checkers,
        &params,
        &resolver,
        &call_contexts,
        FunctionId(0),
        engine,
    );

    let exit = fixpoint.run(Interval::bottom(), false, &NoOpListener);
    assert_eq!(exit, Interval::point(42));
}

/// S4: an indirect call refined against the pointer oracle down to two candidates. The caller's
/// post-call invariant is the join of both candidates' exit invariants.
#[test]
fn indirect_call_with_two_candidates_joins_both_exits() {
    let caller_entry = NodeId(0);
    let f1 = FunctionId(1);
    let f2 = FunctionId(2);
    let f1_entry = NodeId(10);
    let f2_entry = NodeId(20);
    let call_var: fixpoint_engine::testing::Var = 7;

    let mut caller = ToyCfg::new();
    caller.add_node(caller_entry, vec![ToyStmt::Call(ToyCall { id: 0, target: ToyCallTarget::Indirect(call_var) })]);
    caller.set_exits(vec![caller_entry]);

    let mut f1_cfg = ToyCfg::new();
    f1_cfg.add_node(f1_entry, vec![ToyStmt::Assign(10)]);
    f1_cfg.set_exits(vec![f1_entry]);

    let mut f2_cfg = ToyCfg::new();
    f2_cfg.add_node(f2_entry, vec![ToyStmt::Assign(20)]);
    f2_cfg.set_exits(vec![f2_entry]);

    let mut resolver = ToyResolver::new();
    resolver.insert(f1, f1_cfg);
    resolver.insert(f2, f2_cfg);

    let mut oracle = ToyOracle::new();
    oracle.set(call_var, vec![f1, f2]);

    let checkers: CheckerSet<'_, ToyCfg, Interval, CallContextId> = CheckerSet::new(vec![]);
    let params = FixpointParameters::<NodeId, (i64, i64)>::default();
    let call_contexts: RefCell<CallContextInterner<ToyCall, FunctionId>> = RefCell::new(CallContextInterner::new());
    let engine = ToyEngine::new(Some(&oracle), HashSet::new());

    let mut fixpoint = FunctionFixpoint::new_entry_point(
        &caller,
        &checkers,
        &params,
        &resolver,
        &call_contexts,
        FunctionId(0),
        engine,
    );

    let exit = fixpoint.run(Interval::bottom(), false, &NoOpListener);
    assert_eq!(exit, Interval::range(10, 20));
}

/// S5: direct self-recursion. The second, nested invocation of the same function must be caught
/// by the call-context stack and modeled as an unknown call rather than recursing forever.
#[test]
fn self_recursion_is_detected_and_modeled_as_unknown() {
    let node = NodeId(0);
    let function = FunctionId(0);

    let mut cfg = ToyCfg::new();
    cfg.add_node(node, vec![ToyStmt::Call(ToyCall { id: 0, target: ToyCallTarget::Direct(function) })]);
    cfg.set_exits(vec![node]);

    let mut resolver = ToyResolver::new();
    resolver.insert(function, cfg.clone());

    let checkers: CheckerSet<'_, ToyCfg, Interval, CallContextId> = CheckerSet::new(vec![]);
    let params = FixpointParameters::<NodeId, (i64, i64)>::default();
    let call_contexts: RefCell<CallContextInterner<ToyCall, FunctionId>> = RefCell::new(CallContextInterner::new());
    let engine = ToyEngine::new(None, HashSet::new());

    let mut fixpoint = FunctionFixpoint::new_entry_point(
        &cfg,
        &checkers,
        &params,
        &resolver,
        &call_contexts,
        function,
        engine,
    );

    let exit = fixpoint.run(Interval::bottom(), false, &NoOpListener);
    assert_eq!(exit, Interval::top());
}

/// S6: a call through an undefined target collapses the path to bottom rather than propagating
/// the pre-call invariant, matching a genuinely undefined-behavior call site.
#[test]
fn undefined_call_target_collapses_to_bottom() {
    let a = NodeId(0);
    let b = NodeId(1);

    let mut cfg = ToyCfg::new();
    cfg.add_node(a, vec![ToyStmt::Assign(1), ToyStmt::Call(ToyCall { id: 0, target: ToyCallTarget::Undefined })]);
    cfg.add_node(b, vec![]);
    cfg.add_edge(a, b);
    cfg.set_exits(vec![b]);

    let checkers: CheckerSet<'_, ToyCfg, Interval, CallContextId> = CheckerSet::new(vec![]);
    let params = FixpointParameters::<NodeId, (i64, i64)>::default();
    let resolver = ToyResolver::new();
    let call_contexts: RefCell<CallContextInterner<ToyCall, FunctionId>> = RefCell::new(CallContextInterner::new());
    let engine = ToyEngine::new(None, HashSet::new());

    let mut fixpoint = FunctionFixpoint::new_entry_point(
        &cfg,
        &checkers,
        &params,
        &resolver,
        &call_contexts,
        FunctionId(0),
        engine,
    );

    let exit = fixpoint.run(Interval::bottom(), false, &NoOpListener);
    assert!(exit.is_bottom());
}
