//! # irscope Prelude
//!
//! Convenient re-exports of the most commonly used types. Import this
//! module to get quick access to the program model, the analyses, and
//! their results.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all irscope operations
pub use crate::Error;

/// The result type used throughout irscope
pub use crate::Result;

// ================================================================================================
// Program Model
// ================================================================================================

pub use crate::ir::{
    BinaryOp, Body, CallKind, ClassFlags, ClassId, Exp, FieldId, Invoke, MethodFlags, MethodId,
    MethodRef, Program, ProgramBuilder, Stmt, StmtSite, SubsigId, Type, VarId,
};

// ================================================================================================
// Graphs
// ================================================================================================

pub use crate::graph::{
    CallGraph, Cfg, CfgBuilder, CfgNodeId, ChaBuilder, EdgeKind, Icfg, IcfgBuilder, IcfgNodeId,
};

// ================================================================================================
// Dataflow Analyses
// ================================================================================================

pub use crate::dataflow::{
    solve_inter_constants, ConstantPropagation, CpFact, DataflowAnalysis, DataflowResult,
    DeadCodeDetection, InterConstantPropagation, InterSolver, LiveVariableAnalysis, SetFact,
    Value, WorklistSolver,
};

// ================================================================================================
// Pointer Analysis & Taint
// ================================================================================================

pub use crate::pta::{
    AnalysisOptions, ContextSelector, PointerAnalysis, PointerAnalysisResult,
};

pub use crate::taint::{TaintConfig, TaintFlow, TransferSlot};
