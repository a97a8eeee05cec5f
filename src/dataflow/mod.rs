//! Dataflow analyses and their fixed-point solvers.
//!
//! # Components
//!
//! - [`Value`] / [`CpFact`] / [`SetFact`] - lattice values and facts
//! - [`DataflowAnalysis`] / [`WorklistSolver`] / [`DataflowResult`] -
//!   the intraprocedural contract and engine
//! - [`ConstantPropagation`] - the integer constant lattice instance
//! - [`LiveVariableAnalysis`] - backward liveness over set facts
//! - [`DeadCodeDetection`] - unreachable and useless statements
//! - [`InterDataflowAnalysis`] / [`InterSolver`] /
//!   [`InterConstantPropagation`] - the ICFG solver and the
//!   alias-aware constant propagation built on pointer analysis

mod constprop;
mod deadcode;
mod framework;
mod inter;
mod lattice;
mod liveness;
mod solver;

pub use constprop::ConstantPropagation;
pub use deadcode::DeadCodeDetection;
pub use framework::{DataflowAnalysis, DataflowResult};
pub use inter::{
    solve_inter_constants, InterConstantPropagation, InterDataflowAnalysis, InterDataflowResult,
    InterFacts, InterSolver,
};
pub use lattice::{CpFact, SetFact, Value};
pub use liveness::LiveVariableAnalysis;
pub use solver::WorklistSolver;
