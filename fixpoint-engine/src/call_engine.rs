//! Callee resolution. This module only classifies a call statement's candidate callees; actually
//! running them is `FunctionFixpoint`'s job (it owns the recursion and the deferred-check
//! caches).

use std::fmt::Debug;
use std::hash::Hash;

use fixpoint_core::{Cfg, NumericalEngine, PointerOracle, PointsToSet};

/// Looks up a function's control-flow graph by identity. The only bridge between a
/// [`FunctionFixpoint`](crate::function_fixpoint::FunctionFixpoint) and whatever the analyzer
/// uses to represent a whole program (a module, a call graph, ...).
pub trait CalleeResolver<G: Cfg, Function> {
    fn cfg_of(&self, function: Function) -> Option<&G>;
}

/// Outcome of classifying a call statement's target, before any callee is actually run.
pub(crate) enum Resolution<Function> {
    /// Undefined, null, or any non-function operand used as a call target: undefined behavior.
    InvalidTarget,
    /// Inline assembly: modeled as an extern call with unknown side effects.
    InlineAsm,
    /// An indirect call whose points-to set is empty: invalid pointer dereference.
    InvalidPointer,
    /// An indirect call with no usable points-to information: modeled as an extern call with
    /// unknown side effects.
    Unknown,
    /// One or more concrete candidate callees (after refining the value analysis' points-to
    /// result against the external pointer oracle, for an indirect call).
    Candidates(Vec<Function>),
}

/// Classifies `call`'s target, asserting non-null and refining the points-to set against the
/// pointer oracle along the way.
pub(crate) fn resolve<G, E>(engine: &mut E, call: &G::Call) -> Resolution<E::Function>
where
    G: Cfg,
    E: NumericalEngine<G>,
    E::Function: Copy + Eq + Hash + Debug,
{
    use fixpoint_core::CallTarget;

    match engine.call_target(call) {
        CallTarget::Undefined => Resolution::InvalidTarget,
        CallTarget::InlineAsm => Resolution::InlineAsm,
        CallTarget::Direct(callee) => Resolution::Candidates(vec![callee]),
        CallTarget::Indirect(var) => {
            engine.assert_non_null(var);

            let value_set = engine.points_to_from_value(var);
            let refined = match engine.pointer_info() {
                Some(oracle) => {
                    let oracle_set = oracle.points_to(&var);
                    if oracle_set.is_bottom() || oracle_set.is_top() {
                        value_set
                    } else {
                        value_set.intersect(&oracle_set)
                    }
                }
                None => value_set,
            };

            if refined.is_bottom() {
                Resolution::InvalidPointer
            } else if refined.is_top() {
                Resolution::Unknown
            } else {
                Resolution::Candidates(refined.function_members())
            }
        }
    }
}
