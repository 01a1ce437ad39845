//! Toy abstract domain and CFG so this workspace's own tests have something concrete to run the
//! iterator and call engine against: a single-variable interval domain and a hand-built CFG.

pub mod interval;
pub mod toy_cfg;

pub use interval::{Interval, IntervalThreshold};
pub use toy_cfg::{
    FunctionId, NodeId, ToyCall, ToyCallTarget, ToyCfg, ToyEngine, ToyOracle, ToyPointsToSet, ToyResolver, ToyStmt, Var,
};
