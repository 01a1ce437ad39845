//! The numerical execution-engine and pointer-oracle contracts, consumed but never implemented by
//! this crate. `fixpoint-engine::testing` supplies toy implementations for this workspace's own
//! tests.

use core::fmt::Debug;
use core::hash::Hash;

use crate::cfg::Cfg;
use crate::domain::AbstractValue;

/// How a call statement's target expression classifies, as seen by the numerical engine.
///
/// This is the input to the call engine's callee-resolution procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget<Var, Function> {
    /// Undefined, null, a non-function constant, or a global/local variable used directly as the
    /// call target without ever being assigned a function pointer — undefined behavior.
    Undefined,
    /// Inline assembly: modeled as an unknown extern call.
    InlineAsm,
    /// A direct function-pointer constant: exactly one callee.
    Direct(Function),
    /// An indirect call through a local pointer variable; the call engine must refine this
    /// through the points-to lattice before it knows the candidate set.
    Indirect(Var),
}

/// A lattice of memory locations a pointer variable may hold.
pub trait PointsToSet<Function>: Clone {
    fn bottom() -> Self;
    fn top() -> Self;
    fn is_bottom(&self) -> bool;
    fn is_top(&self) -> bool;

    /// Greatest-lower-bound of two points-to sets, used to refine the value-analysis result
    /// against the external oracle's result.
    fn intersect(&self, other: &Self) -> Self;

    /// Function-typed members of the set. Meaningless (and never called by the core) when the
    /// set is bottom or top.
    fn function_members(&self) -> Vec<Function>;
}

/// External pointer-analysis oracle, consulted to refine an indirect call's candidate set.
pub trait PointerOracle<Var, Function> {
    type Set: PointsToSet<Function>;

    fn points_to(&self, var: &Var) -> Self::Set;
}

/// The numerical execution engine driving one function's transfer functions.
///
/// The engine owns its current invariant internally (`set_inv` / `inv` / `take_inv`) rather than
/// threading values through return positions, and is driven by a sequence of `exec_*` mutators.
pub trait NumericalEngine<G: Cfg>: Sized {
    type Value: AbstractValue;
    type Function: Copy + Eq + Hash + Debug;
    type Var: Copy + Eq + Hash + Debug;
    type Oracle: PointerOracle<Self::Var, Self::Function>;

    fn set_inv(&mut self, inv: Self::Value);
    fn inv(&self) -> &Self::Value;
    /// Takes ownership of the current invariant, leaving `bottom` in its place.
    fn take_inv(&mut self) -> Self::Value;

    fn exec_enter(&mut self, bb: G::Node);
    fn exec_leave(&mut self, bb: G::Node);
    fn exec_edge(&mut self, src: G::Node, dest: G::Node);

    /// Transfer function for a single non-call statement.
    fn exec_stmt(&mut self, stmt: &G::Stmt);

    fn call_target(&self, call: &G::Call) -> CallTarget<Self::Var, Self::Function>;

    /// Points-to set for `var` as seen by the value analysis alone (before refinement against
    /// the external oracle).
    fn points_to_from_value(
        &self,
        var: Self::Var,
    ) -> <Self::Oracle as PointerOracle<Self::Var, Self::Function>>::Set;

    /// Asserts the pointer is non-null in the current invariant, ahead of an indirect dispatch.
    fn assert_non_null(&mut self, var: Self::Var);

    /// Whether `callee`'s type signature matches `call`'s — used to filter imprecision out of
    /// the oracle's candidate set.
    fn is_function_typed(&self, callee: Self::Function, call: &G::Call) -> bool;

    fn is_external(&self, callee: Self::Function) -> bool;

    fn exec_extern_call(&mut self, call: &G::Call, callee: Self::Function);
    fn exec_unknown_extern_call(&mut self, call: &G::Call);
    fn exec_unknown_intern_call(&mut self, call: &G::Call);

    fn match_down(&mut self, call: &G::Call, callee: Self::Function);
    fn match_up(&mut self, call: &G::Call, callee_exit: &Self::Value);

    fn deallocate_local_variables(&mut self, function: Self::Function);

    /// A new engine instance sharing this one's immutable context (globals, oracle, kernel...),
    /// used to drive a child function fixpoint for a resolved callee.
    fn fork(&self) -> Self;

    fn pointer_info(&self) -> Option<&Self::Oracle>;
}
