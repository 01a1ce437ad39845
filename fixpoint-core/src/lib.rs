//! Memory-optimized interprocedural fixpoint core: weak topological orders, the lattice contract
//! an abstract value must satisfy, and the read-only CFG/checker/engine seams the fixpoint
//! iterator (in `fixpoint-engine`) drives through.
//!
//! This crate owns no iteration loop and no invariant table — it is the shared vocabulary between
//! a numerical analysis, its control-flow graph, and the engine that fixpoints them together.

mod macros;

pub mod cfg;
pub mod checker;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod params;
pub mod wto;

pub use cfg::Cfg;
pub use checker::{Checker, CheckerSet};
pub use domain::AbstractValue;
pub use engine::{CallTarget, NumericalEngine, PointerOracle, PointsToSet};
pub use errors::WtoError;
pub use params::{FixpointParameters, NarrowingStrategy, WideningStrategy};
pub use wto::{Component, Wto};
