//! Per-function fixpoint with inlining call execution: drives a function's own iterator while
//! recursing into callees' fixpoints inline, rather than analyzing them separately.

use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;

use fixpoint_core::{AbstractValue, CheckerSet, Cfg, FixpointParameters, NumericalEngine, Wto};

use crate::call_context::{CallContextId, CallContextInterner};
use crate::call_engine::{self, CalleeResolver, Resolution};
use crate::caches::{CallCache, CalleeCache};
use crate::errors::EngineError;
use crate::invariant_table::{InvariantTable, Invariants};
use crate::iterator::{FixpointCallbacks, FixpointIterator};
use crate::listener::{IterationListener, NoOpListener};

/// A function's completed analysis, kept alive only long enough to replay whatever checks it had
/// to defer. Type-erased so a caller holding one doesn't need to name the analyzer's full generic
/// instantiation.
pub trait DeferredRunner {
    fn run_all_deferred_checks(self: Box<Self>);
}

/// Drives one function's fixpoint: builds its WTO, runs the interleaved iterator over it, and
/// executes call statements by resolving callees and recursing into their own fixpoints.
pub struct FunctionFixpoint<'a, G, E, R>
where
    G: Cfg,
    E: NumericalEngine<G>,
    R: CalleeResolver<G, E::Function>,
{
    cfg: &'a G,
    checkers: &'a CheckerSet<'a, G, E::Value, CallContextId>,
    params: &'a FixpointParameters<G::Node, <E::Value as AbstractValue>::Threshold>,
    resolver: &'a R,
    call_contexts: &'a RefCell<CallContextInterner<G::Call, E::Function>>,
    function: E::Function,
    call_ctx: CallContextId,
    engine: E,
    call_cache: CallCache<G::Node, G::Call, E::Value>,
    callee_cache: CalleeCache<G::Node, E::Function, Box<dyn DeferredRunner + 'a>>,
    /// Leftover pre-invariants from a deferred run, held onto until [`Self::run_all_deferred_checks`]
    /// replays the checks recorded against them.
    deferred_pre: Option<InvariantTable<G::Node, E::Value>>,
    exit_inv: Option<E::Value>,
}

impl<'a, G, E, R> FunctionFixpoint<'a, G, E, R>
where
    G: Cfg,
    G::Node: Eq + Hash,
    G::Call: Eq + Hash + Clone,
    E: NumericalEngine<G> + 'a,
    E::Function: Copy + Eq + Hash + Debug,
    R: CalleeResolver<G, E::Function>,
{
    /// Creates the fixpoint for `function`'s entry point: empty call context, checks not
    /// deferred.
    pub fn new_entry_point(
        cfg: &'a G,
        checkers: &'a CheckerSet<'a, G, E::Value, CallContextId>,
        params: &'a FixpointParameters<G::Node, <E::Value as AbstractValue>::Threshold>,
        resolver: &'a R,
        call_contexts: &'a RefCell<CallContextInterner<G::Call, E::Function>>,
        function: E::Function,
        engine: E,
    ) -> Self {
        let call_ctx = call_contexts.borrow().empty();
        Self::new(cfg, checkers, params, resolver, call_contexts, function, call_ctx, engine)
    }

    fn new_callee(
        cfg: &'a G,
        checkers: &'a CheckerSet<'a, G, E::Value, CallContextId>,
        params: &'a FixpointParameters<G::Node, <E::Value as AbstractValue>::Threshold>,
        resolver: &'a R,
        call_contexts: &'a RefCell<CallContextInterner<G::Call, E::Function>>,
        function: E::Function,
        call_ctx: CallContextId,
        engine: E,
    ) -> Self {
        Self::new(cfg, checkers, params, resolver, call_contexts, function, call_ctx, engine)
    }

    fn new(
        cfg: &'a G,
        checkers: &'a CheckerSet<'a, G, E::Value, CallContextId>,
        params: &'a FixpointParameters<G::Node, <E::Value as AbstractValue>::Threshold>,
        resolver: &'a R,
        call_contexts: &'a RefCell<CallContextInterner<G::Call, E::Function>>,
        function: E::Function,
        call_ctx: CallContextId,
        engine: E,
    ) -> Self {
        Self {
            cfg,
            checkers,
            params,
            resolver,
            call_contexts,
            function,
            call_ctx,
            engine,
            call_cache: CallCache::new(),
            callee_cache: CalleeCache::new(),
            deferred_pre: None,
            exit_inv: None,
        }
    }

    /// Computes the fixpoint starting from `init`, with checks run eagerly unless the caller
    /// (another `FunctionFixpoint`, when this is an inlined callee) asked us to defer them.
    /// Returns the invariant at the function's exit, after local-variable deallocation.
    pub fn run(&mut self, init: E::Value, defer_checks: bool, listener: &dyn IterationListener<G::Node>) -> E::Value {
        let wto = Wto::build(self.cfg, self.checkers).unwrap_or_else(|source| {
            panic!("{}", EngineError { function: format!("{:?}", self.function), source })
        });

        let mut iterator = FixpointIterator::new(self.cfg, &wto, defer_checks, self.params);
        iterator.run(init, self, listener);

        self.deferred_pre = Some(iterator.take_pre());

        self.exit_inv.take().unwrap_or_else(E::Value::bottom)
    }

    /// Replays whatever checks this function's own run had to defer, then recurses into any
    /// callees whose analyses are cached here for the same reason.
    pub fn run_all_deferred_checks(&mut self) {
        let leftover = self.deferred_pre.take().unwrap_or_default();
        for (node, pre) in leftover.into_entries() {
            self.run_deferred_checks_with(node, pre);
        }

        for (_, children) in self.callee_cache.drain() {
            for (_, child) in children {
                child.run_all_deferred_checks();
            }
        }
    }

    fn has_deferred_checks(&self) -> bool {
        !self.callee_cache.is_empty()
    }

    /// Runs one call statement against its resolved callees, folding every callee's result (or an
    /// unknown/extern approximation) into the engine's current invariant.
    fn execute_call(&mut self, node: G::Node, call: &G::Call, defer_checks: bool, cache_calls: bool) {
        if self.engine.inv().is_normal_flow_bottom() {
            return;
        }

        let resolution = call_engine::resolve(&mut self.engine, call);

        match resolution {
            Resolution::InvalidTarget | Resolution::InvalidPointer => {
                let mut bottom = self.engine.take_inv();
                bottom.set_normal_flow_to_bottom();
                self.engine.set_inv(bottom);
            }
            Resolution::InlineAsm | Resolution::Unknown => {
                self.engine.exec_unknown_extern_call(call);
            }
            Resolution::Candidates(callees) => {
                self.dispatch_candidates(node, call, callees, defer_checks, cache_calls);
            }
        }
    }

    fn dispatch_candidates(
        &mut self,
        node: G::Node,
        call: &G::Call,
        callees: Vec<E::Function>,
        defer_checks: bool,
        cache_calls: bool,
    ) {
        // Recursion check happens before any callee is analyzed: an indirect call whose
        // candidate set includes a function already on the call-context stack makes the whole
        // call unknown rather than re-entering it.
        for &callee in &callees {
            if self.call_contexts.borrow().contains(self.call_ctx, &callee) {
                self.engine.exec_unknown_intern_call(call);
                return;
            }
        }

        let mut post = self.engine.inv().clone();
        post.set_normal_flow_to_bottom();
        let mut analyzed_count: u32 = 0;

        for callee in callees {
            if !self.engine.is_function_typed(callee, call) {
                continue;
            }

            if self.engine.is_external(callee) {
                let mut forked = self.engine.fork();
                forked.set_inv(self.engine.inv().ignore_exceptions());
                forked.exec_extern_call(call, callee);
                let mut result = forked.take_inv();
                result.merge_propagated_in_caught_exceptions();
                post = post.join(&result);
                continue;
            }

            let Some(callee_cfg) = self.resolver.cfg_of(callee) else {
                continue;
            };

            let mut forked = self.engine.fork();
            forked.set_inv(self.engine.inv().ignore_exceptions());
            forked.match_down(call, callee);
            let init = forked.take_inv();

            analyzed_count += 1;

            let child_ctx = self.call_contexts.borrow_mut().push(self.call_ctx, call.clone(), callee);
            let mut child = Self::new_callee(
                callee_cfg,
                self.checkers,
                self.params,
                self.resolver,
                self.call_contexts,
                callee,
                child_ctx,
                forked,
            );

            let callee_exit = child.run(init, defer_checks, &NoOpListener);
            let has_deferred = child.has_deferred_checks();

            let mut result = callee_exit.clone();
            result.merge_propagated_in_caught_exceptions();

            if has_deferred {
                self.callee_cache.push(node, callee, Box::new(child));
            }

            if result.is_normal_flow_bottom() {
                post = post.join(&result);
                continue;
            }

            let mut resumed = self.engine.fork();
            resumed.set_inv(result);
            resumed.match_up(call, &callee_exit);
            post = post.join(resumed.inv());
        }

        self.engine.set_inv(post);

        if cache_calls && analyzed_count != 0 {
            self.call_cache.set(node, call.clone(), self.engine.inv().clone());
        }
    }

    /// Runs `node`'s statements from `pre`, substituting any cached call result instead of
    /// re-executing it, and running every check now that invariants are final.
    fn run_deferred_checks_with(&mut self, node: G::Node, pre: E::Value) {
        self.engine.set_inv(pre);
        self.engine.exec_enter(node);

        for stmt in self.cfg.statements(node).to_vec() {
            if let Some(call) = G::as_call(&stmt) {
                if let Some(cached) = self.call_cache.take(node, call) {
                    self.checkers.check_all(&stmt, self.engine.inv(), &self.call_ctx);
                    self.engine.set_inv(cached);
                    continue;
                }
            }

            self.checkers.check_all(&stmt, self.engine.inv(), &self.call_ctx);

            if let Some(call) = G::as_call(&stmt) {
                self.execute_call(node, call, false, false);
            } else {
                self.engine.exec_stmt(&stmt);
            }
        }

        self.call_cache.erase_block(node);
        self.engine.exec_leave(node);
    }
}

impl<'a, G, E, R> DeferredRunner for FunctionFixpoint<'a, G, E, R>
where
    G: Cfg,
    G::Node: Eq + Hash,
    G::Call: Eq + Hash + Clone,
    E: NumericalEngine<G> + 'a,
    E::Function: Copy + Eq + Hash + Debug,
    R: CalleeResolver<G, E::Function>,
{
    fn run_all_deferred_checks(mut self: Box<Self>) {
        FunctionFixpoint::run_all_deferred_checks(&mut *self);
    }
}

impl<'a, G, E, R> FixpointCallbacks<G, E::Value> for FunctionFixpoint<'a, G, E, R>
where
    G: Cfg,
    G::Node: Eq + Hash,
    G::Call: Eq + Hash + Clone,
    E: NumericalEngine<G> + 'a,
    E::Function: Copy + Eq + Hash + Debug,
    R: CalleeResolver<G, E::Function>,
{
    fn analyze_node(&mut self, node: G::Node, pre: E::Value, defer_checks: bool, cache_calls: bool) -> E::Value {
        self.engine.set_inv(pre);
        self.engine.exec_enter(node);

        for stmt in self.cfg.statements(node).to_vec() {
            if !defer_checks {
                self.checkers.check_all(&stmt, self.engine.inv(), &self.call_ctx);
            }

            if let Some(call) = G::as_call(&stmt) {
                self.execute_call(node, call, defer_checks, cache_calls);
            } else {
                self.engine.exec_stmt(&stmt);
            }
        }

        self.engine.exec_leave(node);
        self.engine.take_inv()
    }

    fn analyze_edge(&mut self, src: G::Node, dest: G::Node, pre: E::Value) -> E::Value {
        self.engine.set_inv(pre);
        self.engine.exec_edge(src, dest);
        self.engine.take_inv()
    }

    fn process_post(&mut self, node: G::Node, post: &E::Value) {
        if self.cfg.exits().contains(&node) {
            self.engine.set_inv(post.clone());
            self.engine.deallocate_local_variables(self.function);
            self.exit_inv = Some(self.engine.take_inv());
        }
    }

    fn run_deferred_checks_in_component(
        &mut self,
        head: G::Node,
        wto: &Wto<G::Node>,
        invariants: &mut Invariants<'_, G::Node, E::Value>,
    ) {
        if wto.has_check(head) {
            let pre = invariants.take_pre(head);
            self.run_deferred_checks_with(head, pre);
        }
        if let Some(children) = wto.children_with_checks(head) {
            for &node in children {
                let pre = invariants.take_pre(node);
                self.run_deferred_checks_with(node, pre);
            }
        }
        if let Some(children) = wto.children_with_calls(head) {
            for &node in children {
                for (_, child) in self.callee_cache.take(node) {
                    child.run_all_deferred_checks();
                }
            }
        }
    }

    fn erase_values_cached_for_deferred_checks(
        &mut self,
        head: G::Node,
        wto: &Wto<G::Node>,
        invariants: &mut Invariants<'_, G::Node, E::Value>,
    ) {
        self.call_cache.erase_block(head);
        if let Some(children) = wto.children_with_checks(head) {
            for &node in children {
                invariants.erase_pre(node);
                self.call_cache.erase_block(node);
            }
        }
        if let Some(children) = wto.children_with_post(head) {
            for &node in children {
                invariants.erase_post(node);
            }
        }
        if let Some(children) = wto.children_with_calls(head) {
            for &node in children {
                self.callee_cache.take(node);
            }
        }
    }
}
