#![deny(missing_docs)]
#![allow(dead_code)]

//! # irscope
//!
//! A static analysis framework for an object-oriented, class-based
//! bytecode-like intermediate representation. Programs arrive already
//! lowered to three-address-code statements organized into per-method
//! control-flow graphs; `irscope` computes facts about them: dead code,
//! constant values of integer variables, call targets, points-to sets,
//! interprocedural constants refined by aliasing, and taint flows from
//! sources to sinks.
//!
//! # Architecture
//!
//! The crate is organized into layers that build on each other:
//!
//! - **IR Layer** ([`crate::ir`]): the program model consumed by every
//!   analysis: types, classes, fields, methods, variables,
//!   three-address statements, and the class hierarchy, plus a builder
//!   for constructing programs in memory.
//! - **Graph Layer** ([`crate::graph`]): per-method control-flow graphs,
//!   the interprocedural CFG, and call graphs including the
//!   class-hierarchy-analysis builder.
//! - **Dataflow Layer** ([`crate::dataflow`]): the lattice and fact
//!   types, the generic worklist solver, constant propagation, live
//!   variables, dead-code detection, and the interprocedural solver
//!   with alias-aware constant propagation.
//! - **Pointer Analysis Layer** ([`crate::pta`]): the pointer flow
//!   graph, context selectors, and the worklist solver shared by the
//!   context-insensitive and context-sensitive variants.
//! - **Taint Layer** ([`crate::taint`]): source/sink/transfer
//!   configuration and the taint overlay that rides on the
//!   context-sensitive pointer analysis.
//!
//! # Key Components
//!
//! - [`crate::ir::Program`] / [`crate::ir::ProgramBuilder`] - the
//!   analysis root and its construction surface
//! - [`crate::dataflow::WorklistSolver`] - the generic fixed-point
//!   engine for forward and backward analyses
//! - [`crate::dataflow::ConstantPropagation`] - the integer constant
//!   lattice instance
//! - [`crate::graph::ChaBuilder`] - call-graph construction via class
//!   hierarchy analysis
//! - [`crate::pta::PointerAnalysis`] - Andersen-style pointer analysis
//!   with pluggable context sensitivity
//! - [`crate::taint::TaintConfig`] - taint sources, sinks, and
//!   transfers
//! - [`crate::Error`] and [`crate::Result`] - error handling
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use irscope::prelude::*;
//!
//! # fn build_program() -> irscope::ir::Program { unimplemented!() }
//! let program = build_program();
//!
//! // Intraprocedural constant propagation for the entry method.
//! let entry = program.entry_method().unwrap();
//! let cfg = CfgBuilder::build(&program, entry);
//! let analysis = ConstantPropagation::new(&program, entry);
//! let constants = WorklistSolver::new(&analysis).solve(&cfg);
//!
//! // Context-sensitive pointer analysis with 1-call-site contexts.
//! let options = AnalysisOptions::new("1-call");
//! let pta = PointerAnalysis::run(&program, &options).unwrap();
//! for (var, objs) in pta.iter_var_points_to() {
//!     println!("{var:?} -> {} objects", objs.len());
//! }
//! ```
//!
//! # Determinism
//!
//! Two runs over the same program produce byte-identical results: all
//! observable iteration (pointer-flow-graph successors, call-graph
//! edges, points-to sets, worklists) follows insertion order, and
//! result sets are explicitly ordered.

pub mod dataflow;
pub mod graph;
pub mod ir;
pub mod pta;
pub mod taint;

mod error;
pub mod prelude;

#[cfg(test)]
pub(crate) mod test;

pub use error::{Error, Result};
