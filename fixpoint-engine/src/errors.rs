//! Errors produced by a running fixpoint, as opposed to `fixpoint-core::errors`'s
//! construction-time rejections.

use fixpoint_core::WtoError;
use miette::Diagnostic;

/// Wraps a [`WtoError`] with the function it was raised for.
///
/// A malformed CFG here is unconditionally a caller bug — this type exists only to attach a
/// diagnostic-friendly function name before the single in-tree caller (`FunctionFixpoint::run`)
/// panics with it.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("cannot compute a fixpoint for function {function}: {source}")]
pub struct EngineError {
    pub function: String,
    #[source]
    pub source: WtoError,
}
