//! Pointer analysis.
//!
//! An Andersen-style, flow-insensitive points-to analysis over the
//! pointer flow graph, with pluggable context sensitivity and an
//! on-the-fly call graph. The context-insensitive variant is the same
//! solver run with the insensitive selector.
//!
//! # Components
//!
//! - [`PointerAnalysis`] / [`AnalysisOptions`] - entry points
//! - [`ContextSelector`] / [`Ctx`] - context policies
//! - [`CsManager`] - interning of (context, entity) pairs to dense ids
//! - [`HeapModel`] - allocation-site objects and taint objects
//! - [`PointerFlowGraph`] / [`PointsToSet`] - the propagation core
//! - [`PointerAnalysisResult`] - the frozen, published views

mod callgraph;
mod context;
mod element;
mod heap;
mod pfg;
mod pts;
mod result;
mod solver;

pub use callgraph::{CsCallEdge, CsCallGraph};
pub use context::{Ctx, CtxElem, ContextSelector};
pub use element::{CsCallSiteId, CsManager, CsMethodId, CsObjId, CtxId, PointerId, PointerKey};
pub use heap::{HeapModel, ObjId, ObjKind};
pub use pfg::PointerFlowGraph;
pub use pts::{PointsToSet, PointsToStore};
pub use result::PointerAnalysisResult;
pub use solver::{AnalysisOptions, PointerAnalysis, WorkList};
