//! The interleaved fixpoint iterator and inlining call engine, built on top of `fixpoint-core`'s
//! CFG/domain/engine contracts and its weak topological order.
//!
//! This crate owns the one mutable thing `fixpoint-core` deliberately doesn't: the pre/post
//! invariant tables, the call-context stack, and the deferred-check replay caches that make
//! interprocedural analysis tractable without re-running a callee's body every time its result is
//! needed.

pub mod call_context;
pub mod call_engine;
pub mod caches;
pub mod errors;
pub mod function_fixpoint;
pub mod invariant_table;
pub mod iterator;
pub mod listener;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use call_context::{CallContextId, CallContextInterner, SharedCallContexts};
pub use call_engine::CalleeResolver;
pub use errors::EngineError;
pub use function_fixpoint::{DeferredRunner, FunctionFixpoint};
pub use invariant_table::Invariants;
pub use iterator::{FixpointCallbacks, FixpointIterator};
pub use listener::{IterationListener, NoOpListener, TracingIterationListener};
pub use state::FixpointIterationKind;
