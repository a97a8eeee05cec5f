//! Control-flow and call graphs.
//!
//! # Components
//!
//! - [`Cfg`] / [`CfgBuilder`] - per-method control-flow graph with
//!   labelled edges and synthetic entry/exit nodes
//! - [`CallGraph`] / [`ChaBuilder`] - reachable methods and call edges;
//!   CHA resolves virtual dispatch through the class hierarchy
//! - [`Icfg`] / [`IcfgBuilder`] - the interprocedural CFG with Normal,
//!   Call, Return, and CallToReturn edges

mod callgraph;
mod cfg;
mod icfg;

pub use callgraph::{CallEdge, CallGraph, ChaBuilder};
pub use cfg::{Cfg, CfgBuilder, CfgEdge, CfgNodeId, EdgeKind};
pub use icfg::{Icfg, IcfgBuilder, IcfgEdge, IcfgEdgeKind, IcfgNodeId};
