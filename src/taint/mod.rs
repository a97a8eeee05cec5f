//! Taint analysis riding on the context-sensitive pointer analysis.
//!
//! Taint is modelled as a distinguished population of heap objects:
//! a source call mints one, transfers re-mint it at the transfer's
//! declared type (keeping the originating call), and the ordinary
//! points-to propagation carries it everywhere a real value could
//! flow. When the pointer analysis finishes, every sink argument whose
//! points-to set holds a taint object becomes a [`TaintFlow`].
//!
//! # Components
//!
//! - [`TaintConfig`] / [`Source`] / [`Sink`] / [`Transfer`] - the
//!   immutable configuration, programmatic or YAML-loaded
//! - [`TaintAnalysis`] - the overlay the solver invokes at call edges
//! - [`TaintFlow`] - one detected source-to-sink flow

mod config;

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::ir::{Invoke, MethodId, Program, StmtSite, Type};
use crate::pta::{
    CsCallGraph, CsManager, CtxId, HeapModel, PointsToSet, PointsToStore, WorkList,
};

pub use config::{Sink, Source, TaintConfig, Transfer, TransferSlot};

/// One detected flow from a source call to a sink argument.
///
/// Flows order by source call, then sink call, then argument index;
/// distinct source calls reaching the same sink stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaintFlow {
    /// The call that minted the taint.
    pub source: StmtSite,
    /// The sink call the taint reached.
    pub sink: StmtSite,
    /// The sink argument position it arrived at.
    pub index: usize,
}

/// The overlay invoked by the pointer-analysis solver.
///
/// Holds the configuration indexed by method so the per-call hooks are
/// cheap. All mutable analysis state (heap, interning, worklist) stays
/// with the solver and is passed in explicitly.
#[derive(Debug)]
pub struct TaintAnalysis {
    config: TaintConfig,
    sources: FxHashMap<MethodId, Type>,
    sinks: FxHashMap<MethodId, Vec<usize>>,
    transfers: FxHashMap<MethodId, Vec<usize>>,
}

impl TaintAnalysis {
    /// Indexes a configuration for use by the solver.
    #[must_use]
    pub fn new(config: TaintConfig) -> Self {
        let mut sources = FxHashMap::default();
        for source in &config.sources {
            sources.insert(source.method, source.ty.clone());
        }
        let mut sinks: FxHashMap<MethodId, Vec<usize>> = FxHashMap::default();
        for sink in &config.sinks {
            sinks.entry(sink.method).or_default().push(sink.index);
        }
        let mut transfers: FxHashMap<MethodId, Vec<usize>> = FxHashMap::default();
        for (index, transfer) in config.transfers.iter().enumerate() {
            transfers.entry(transfer.method).or_default().push(index);
        }
        info!(
            sources = config.sources.len(),
            sinks = config.sinks.len(),
            transfers = config.transfers.len(),
            "taint configuration loaded"
        );
        Self {
            config,
            sources,
            sinks,
            transfers,
        }
    }

    /// Returns `true` if the method matches any transfer record.
    #[must_use]
    pub fn has_transfers(&self, method: MethodId) -> bool {
        self.transfers.contains_key(&method)
    }

    /// If `callee` is a source and the call binds a result, mints the
    /// taint object and injects it into the result variable's
    /// points-to set through the worklist.
    pub(crate) fn inject_source(
        &self,
        invoke: &Invoke,
        site: StmtSite,
        callee: MethodId,
        caller_ctx: CtxId,
        empty_ctx: CtxId,
        heap: &mut HeapModel,
        csm: &mut CsManager,
        worklist: &mut WorkList,
    ) {
        let Some(ty) = self.sources.get(&callee) else {
            return;
        };
        let Some(result) = invoke.result else {
            return;
        };
        let taint = heap.taint_obj(site, ty.clone());
        let cs_taint = csm.cs_obj(empty_ctx, taint);
        let target = csm.var_ptr(caller_ctx, result);
        worklist.push_back((target, PointsToSet::single(cs_taint)));
    }

    /// Applies every transfer record of `callee` to one invocation:
    /// reads the from-slot's current points-to set, re-mints the taint
    /// objects found there at the transfer's type, and injects them
    /// into the to-slot.
    ///
    /// Idempotent, so the solver re-invokes it whenever a slot
    /// variable gains objects.
    pub(crate) fn apply_transfers(
        &self,
        invoke: &Invoke,
        callee: MethodId,
        caller_ctx: CtxId,
        empty_ctx: CtxId,
        heap: &mut HeapModel,
        csm: &mut CsManager,
        pts: &PointsToStore,
        worklist: &mut WorkList,
    ) {
        let Some(indices) = self.transfers.get(&callee) else {
            return;
        };
        for &index in indices {
            let transfer = &self.config.transfers[index];
            let Some(from_var) = Self::slot_var(invoke, transfer.from) else {
                continue;
            };
            let Some(to_var) = Self::slot_var(invoke, transfer.to) else {
                continue;
            };

            let from_ptr = csm.var_ptr(caller_ctx, from_var);
            let mut injected = PointsToSet::new();
            let from_objs: Vec<_> = pts.objects(from_ptr).collect();
            for cs_obj in from_objs {
                let (_, obj) = csm.cs_obj_parts(cs_obj);
                let Some(source) = heap.taint_source(obj) else {
                    continue;
                };
                // re-typed, same originating source call
                let minted = heap.taint_obj(source, transfer.ty.clone());
                injected.add(csm.cs_obj(empty_ctx, minted));
            }
            if !injected.is_empty() {
                let target = csm.var_ptr(caller_ctx, to_var);
                worklist.push_back((target, injected));
            }
        }
    }

    fn slot_var(invoke: &Invoke, slot: TransferSlot) -> Option<crate::ir::VarId> {
        match slot {
            TransferSlot::Base => invoke.receiver,
            TransferSlot::Result => invoke.result,
            TransferSlot::Arg(i) => invoke.args.get(i).copied(),
        }
    }

    /// Walks the finished call graph and reports every taint object
    /// sitting in a sink argument's points-to set, under the call
    /// site's own context.
    pub(crate) fn collect_flows(
        &self,
        program: &Program,
        call_graph: &CsCallGraph,
        csm: &CsManager,
        heap: &HeapModel,
        pts: &PointsToStore,
    ) -> BTreeSet<TaintFlow> {
        let mut flows = BTreeSet::new();
        for edge in call_graph.edges() {
            let (_, callee) = csm.cs_method_parts(edge.callee);
            let Some(indices) = self.sinks.get(&callee) else {
                continue;
            };
            let (ctx, site) = csm.cs_call_site_parts(edge.site);
            let Some(invoke) = program.stmt(site).as_invoke() else {
                continue;
            };
            for &index in indices {
                let Some(&arg) = invoke.args.get(index) else {
                    warn!(?site, index, "sink argument index out of range");
                    continue;
                };
                let Some(ptr) = csm.find_var_ptr(ctx, arg) else {
                    continue;
                };
                for cs_obj in pts.objects(ptr) {
                    let (_, obj) = csm.cs_obj_parts(cs_obj);
                    if let Some(source) = heap.taint_source(obj) {
                        flows.insert(TaintFlow {
                            source,
                            sink: site,
                            index,
                        });
                    }
                }
            }
        }
        flows
    }
}
