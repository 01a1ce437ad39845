//! Fatal-assertion helper.
//!
//! A handful of conditions are programming errors, not recoverable conditions: duplicate
//! insertion into an invariant table, erasure of an absent key, or a called-operand kind the
//! builder cannot classify. These are modeled as panics, never as `Result`, so that a caller
//! cannot accidentally swallow them.

/// Panics with a message identifying which core invariant was violated.
macro_rules! bug {
    ($($arg:tt)*) => {
        panic!("fixpoint-core: internal invariant violated: {}", format_args!($($arg)*))
    };
}

pub(crate) use bug;
