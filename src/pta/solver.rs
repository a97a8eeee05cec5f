//! The pointer-analysis worklist solver.
//!
//! One algorithm serves both sensitivities: every entity is keyed by a
//! context, and the insensitive selector keys everything by the empty
//! context. Reachable-method discovery seeds allocations, copies,
//! static field accesses, and static calls; the worklist loop
//! propagates points-to deltas along the pointer flow graph and, when
//! a variable gains objects, wires up the field/array accesses and
//! instance calls that variable participates in. The call graph grows
//! on the fly.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::graph::{CallEdge, CallGraph};
use crate::ir::{CallKind, Exp, MethodId, Program, Stmt, StmtSite, VarId};
use crate::pta::callgraph::{CsCallEdge, CsCallGraph};
use crate::pta::context::{Ctx, ContextSelector};
use crate::pta::element::{CsManager, CsObjId, CtxId, PointerId, PointerKey};
use crate::pta::heap::{HeapModel, ObjId};
use crate::pta::pfg::PointerFlowGraph;
use crate::pta::pts::{PointsToSet, PointsToStore};
use crate::pta::result::PointerAnalysisResult;
use crate::taint::{TaintAnalysis, TaintConfig};
use crate::{Error, Result};

/// The solver worklist: pending (pointer, points-to delta) entries.
pub type WorkList = VecDeque<(PointerId, PointsToSet)>;

/// Options of a pointer-analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pta: String,
    taint_config: Option<PathBuf>,
}

impl AnalysisOptions {
    /// Creates options for a pointer-analysis variant id (`ci`,
    /// `1-call`, `2-obj`, ...).
    #[must_use]
    pub fn new(pta: &str) -> Self {
        Self {
            pta: pta.to_string(),
            taint_config: None,
        }
    }

    /// Sets the path of a YAML taint configuration to load.
    #[must_use]
    pub fn with_taint_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.taint_config = Some(path.into());
        self
    }

    /// The pointer-analysis variant id.
    #[must_use]
    pub fn pta_id(&self) -> &str {
        &self.pta
    }

    /// The taint configuration path, if any.
    #[must_use]
    pub fn taint_config_path(&self) -> Option<&Path> {
        self.taint_config.as_deref()
    }
}

/// Entry points for running pointer analysis.
pub struct PointerAnalysis;

impl PointerAnalysis {
    /// Runs the variant selected by `options`, loading the taint
    /// configuration when one is given.
    ///
    /// # Errors
    ///
    /// Unknown variant ids, unreadable or unresolvable taint
    /// configurations, and a missing entry method abort the run.
    pub fn run(program: &Program, options: &AnalysisOptions) -> Result<PointerAnalysisResult> {
        let selector = ContextSelector::parse(options.pta_id())?;
        let taint = match options.taint_config_path() {
            Some(path) => Some(TaintConfig::from_yaml_path(path, program)?),
            None => None,
        };
        Self::run_with(program, selector, taint)
    }

    /// Runs with an explicit selector and optional taint
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ir`] if the program has no entry method.
    pub fn run_with(
        program: &Program,
        selector: ContextSelector,
        taint: Option<TaintConfig>,
    ) -> Result<PointerAnalysisResult> {
        let entry = program
            .entry_method()
            .ok_or_else(|| Error::Ir("no entry method designated".to_string()))?;

        let mut solver = Solver::new(program, selector, taint.map(TaintAnalysis::new));
        solver.initialize(entry);
        solver.analyze();
        Ok(solver.into_result())
    }
}

struct Solver<'p> {
    program: &'p Program,
    selector: ContextSelector,
    heap: HeapModel,
    csm: CsManager,
    pts: PointsToStore,
    pfg: PointerFlowGraph,
    cg: CsCallGraph,
    worklist: WorkList,
    taint: Option<TaintAnalysis>,
    empty_ctx: CtxId,
}

impl<'p> Solver<'p> {
    fn new(program: &'p Program, selector: ContextSelector, taint: Option<TaintAnalysis>) -> Self {
        let mut csm = CsManager::new();
        let empty_ctx = csm.ctx(Ctx::empty());
        Self {
            program,
            selector,
            heap: HeapModel::new(),
            csm,
            pts: PointsToStore::new(),
            pfg: PointerFlowGraph::new(),
            cg: CsCallGraph::new(),
            worklist: WorkList::new(),
            taint,
            empty_ctx,
        }
    }

    fn initialize(&mut self, entry: MethodId) {
        let cs_entry = self.csm.cs_method(self.empty_ctx, entry);
        self.add_reachable(cs_entry);
    }

    /// Marks a (context, method) reachable and, on first discovery,
    /// processes its statements.
    fn add_reachable(&mut self, cs_method: crate::pta::element::CsMethodId) {
        if !self.cg.add_reachable(cs_method) {
            return;
        }
        let (ctx, method) = self.csm.cs_method_parts(cs_method);
        debug!(method = %self.program.method(method).name, "new reachable method");
        self.process_stmts(ctx, method);
    }

    fn process_stmts(&mut self, ctx: CtxId, method: MethodId) {
        let program = self.program;
        let Some(body) = program.body(method) else {
            warn!(method = %program.method(method).name, "reachable method has no body");
            return;
        };
        for (index, stmt) in body.stmts.iter().enumerate() {
            let site = StmtSite::new(method, index as u32);
            match stmt {
                Stmt::New { lhs, class } => {
                    let obj = self.heap.alloc_obj(site, *class);
                    let method_ctx = self.csm.ctx_of(ctx).clone();
                    let heap_ctx = self.selector.select_heap(&method_ctx);
                    let heap_ctx = self.csm.ctx(heap_ctx);
                    let cs_obj = self.csm.cs_obj(heap_ctx, obj);
                    let target = self.csm.var_ptr(ctx, *lhs);
                    self.worklist.push_back((target, PointsToSet::single(cs_obj)));
                }
                Stmt::Assign {
                    lhs,
                    rhs: Exp::Var(rhs),
                } if program.var(*lhs).ty.is_reference_like() => {
                    let source = self.csm.var_ptr(ctx, *rhs);
                    let target = self.csm.var_ptr(ctx, *lhs);
                    self.add_pfg_edge(source, target);
                }
                Stmt::LoadField {
                    lhs,
                    base: None,
                    field,
                } => {
                    let source = self.csm.static_field_ptr(*field);
                    let target = self.csm.var_ptr(ctx, *lhs);
                    self.add_pfg_edge(source, target);
                }
                Stmt::StoreField {
                    base: None,
                    field,
                    rhs,
                } => {
                    let source = self.csm.var_ptr(ctx, *rhs);
                    let target = self.csm.static_field_ptr(*field);
                    self.add_pfg_edge(source, target);
                }
                Stmt::Invoke(invoke) if invoke.kind == CallKind::Static => {
                    self.process_static_call(ctx, site, invoke);
                }
                _ => {}
            }
        }
    }

    fn process_static_call(&mut self, ctx: CtxId, site: StmtSite, invoke: &crate::ir::Invoke) {
        let program = self.program;
        let target = program
            .dispatch(invoke.callee.class, invoke.callee.subsig)
            .filter(|&m| !program.method(m).is_abstract());
        let Some(callee) = target else {
            warn!(
                class = %program.class(invoke.callee.class).name,
                subsig = program.subsig_str(invoke.callee.subsig),
                "static dispatch found no target"
            );
            return;
        };

        let caller_ctx = self.csm.ctx_of(ctx).clone();
        let callee_ctx = self.selector.select_static(&caller_ctx, site);
        let callee_ctx = self.csm.ctx(callee_ctx);
        let cs_site = self.csm.cs_call_site(ctx, site);
        let cs_callee = self.csm.cs_method(callee_ctx, callee);

        if self.cg.add_edge(CsCallEdge {
            kind: invoke.kind,
            site: cs_site,
            callee: cs_callee,
        }) {
            self.add_reachable(cs_callee);
            self.wire_call(ctx, invoke, callee, callee_ctx);
        }
        self.run_taint_hooks(ctx, site, invoke, callee);
    }

    /// Adds `source → target` to the pointer flow graph; a new edge
    /// with a non-empty source set seeds the target immediately.
    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if self.pfg.add_edge(source, target) {
            if let Some(set) = self.pts.get(source) {
                if !set.is_empty() {
                    self.worklist.push_back((target, set.clone()));
                }
            }
        }
    }

    /// Drains the worklist to the fixed point.
    fn analyze(&mut self) {
        while let Some((pointer, set)) = self.worklist.pop_front() {
            let delta = self.propagate(pointer, &set);
            if delta.is_empty() {
                continue;
            }
            if let PointerKey::Var(ctx, var) = self.csm.pointer_key(pointer) {
                let program = self.program;
                let usage = program.var_usage(var);

                for cs_obj in delta.iter() {
                    for &store_site in &usage.store_fields {
                        let Stmt::StoreField { field, rhs, .. } = program.stmt(store_site)
                        else {
                            continue;
                        };
                        let source = self.csm.var_ptr(ctx, *rhs);
                        let target = self.csm.instance_field_ptr(cs_obj, *field);
                        self.add_pfg_edge(source, target);
                    }
                    for &load_site in &usage.load_fields {
                        let Stmt::LoadField { lhs, field, .. } = program.stmt(load_site) else {
                            continue;
                        };
                        let source = self.csm.instance_field_ptr(cs_obj, *field);
                        let target = self.csm.var_ptr(ctx, *lhs);
                        self.add_pfg_edge(source, target);
                    }
                    for &store_site in &usage.store_arrays {
                        let Stmt::StoreArray { rhs, .. } = program.stmt(store_site) else {
                            continue;
                        };
                        let source = self.csm.var_ptr(ctx, *rhs);
                        let target = self.csm.array_ptr(cs_obj);
                        self.add_pfg_edge(source, target);
                    }
                    for &load_site in &usage.load_arrays {
                        let Stmt::LoadArray { lhs, .. } = program.stmt(load_site) else {
                            continue;
                        };
                        let source = self.csm.array_ptr(cs_obj);
                        let target = self.csm.var_ptr(ctx, *lhs);
                        self.add_pfg_edge(source, target);
                    }
                    self.process_instance_calls(ctx, var, cs_obj);
                }

                if self.taint.is_some() {
                    self.refire_transfers(ctx, var);
                }
            }
        }
    }

    /// Unions `set` into the pointer's points-to set and forwards the
    /// growth to all PFG successors. Returns the growth.
    fn propagate(&mut self, pointer: PointerId, set: &PointsToSet) -> PointsToSet {
        let mut delta = PointsToSet::new();
        let target = self.pts.ensure(pointer);
        for obj in set.iter() {
            if target.add(obj) {
                delta.add(obj);
            }
        }
        if !delta.is_empty() {
            let succs = self.pfg.succs_of(pointer).to_vec();
            for succ in succs {
                self.worklist.push_back((succ, delta.clone()));
            }
        }
        delta
    }

    /// Processes the instance calls on `recv_var` for one newly
    /// discovered receiver object.
    fn process_instance_calls(&mut self, ctx: CtxId, recv_var: VarId, recv_obj: CsObjId) {
        let program = self.program;
        let invoke_sites = &program.var_usage(recv_var).invokes;
        if invoke_sites.is_empty() {
            return;
        }
        let (recv_ctx_id, obj) = self.csm.cs_obj_parts(recv_obj);

        for &site in invoke_sites {
            let Some(invoke) = program.stmt(site).as_invoke() else {
                continue;
            };
            match invoke.kind {
                CallKind::Static => continue,
                CallKind::Dynamic => {
                    debug!(?site, "dynamic call site left unresolved");
                    continue;
                }
                _ => {}
            }

            // special calls dispatch on the declared class, virtual
            // and interface calls on the receiver object's class
            let dispatch_class = if invoke.kind == CallKind::Special {
                Some(invoke.callee.class)
            } else {
                self.heap.class_of(obj)
            };
            let target = dispatch_class
                .and_then(|class| program.dispatch(class, invoke.callee.subsig))
                .filter(|&m| !program.method(m).is_abstract());
            let Some(callee) = target else {
                warn!(
                    ?site,
                    subsig = program.subsig_str(invoke.callee.subsig),
                    "instance dispatch found no target"
                );
                continue;
            };

            let caller_ctx = self.csm.ctx_of(ctx).clone();
            let recv_ctx = self.csm.ctx_of(recv_ctx_id).clone();
            let recv_class = self.heap.class_of(obj).unwrap_or(invoke.callee.class);
            let callee_ctx =
                self.selector
                    .select_instance(&caller_ctx, site, &recv_ctx, obj, recv_class);
            let callee_ctx = self.csm.ctx(callee_ctx);
            let cs_site = self.csm.cs_call_site(ctx, site);
            let cs_callee = self.csm.cs_method(callee_ctx, callee);

            if let Some(this) = program.body(callee).and_then(|body| body.this) {
                let this_ptr = self.csm.var_ptr(callee_ctx, this);
                self.worklist
                    .push_back((this_ptr, PointsToSet::single(recv_obj)));
            }

            if self.cg.add_edge(CsCallEdge {
                kind: invoke.kind,
                site: cs_site,
                callee: cs_callee,
            }) {
                self.add_reachable(cs_callee);
                self.wire_call(ctx, invoke, callee, callee_ctx);
            }
            self.run_taint_hooks(ctx, site, invoke, callee);
        }
    }

    /// Wires argument and return flow between caller and callee
    /// contexts.
    fn wire_call(
        &mut self,
        caller_ctx: CtxId,
        invoke: &crate::ir::Invoke,
        callee: MethodId,
        callee_ctx: CtxId,
    ) {
        let program = self.program;
        let Some(body) = program.body(callee) else {
            return;
        };
        for (&param, &arg) in body.params.iter().zip(&invoke.args) {
            let source = self.csm.var_ptr(caller_ctx, arg);
            let target = self.csm.var_ptr(callee_ctx, param);
            self.add_pfg_edge(source, target);
        }
        if let Some(result) = invoke.result {
            let target = self.csm.var_ptr(caller_ctx, result);
            for &ret in &body.return_vars {
                let source = self.csm.var_ptr(callee_ctx, ret);
                self.add_pfg_edge(source, target);
            }
        }
    }

    /// Source injection and transfer application at a call.
    fn run_taint_hooks(
        &mut self,
        caller_ctx: CtxId,
        site: StmtSite,
        invoke: &crate::ir::Invoke,
        callee: MethodId,
    ) {
        let Some(taint) = &self.taint else {
            return;
        };
        taint.inject_source(
            invoke,
            site,
            callee,
            caller_ctx,
            self.empty_ctx,
            &mut self.heap,
            &mut self.csm,
            &mut self.worklist,
        );
        taint.apply_transfers(
            invoke,
            callee,
            caller_ctx,
            self.empty_ctx,
            &mut self.heap,
            &mut self.csm,
            &self.pts,
            &mut self.worklist,
        );
    }

    /// Re-applies the transfers of every already-resolved call the
    /// variable occupies a slot of. Taint can reach an argument after
    /// the call site was first processed; transfers are idempotent, so
    /// re-firing converges.
    fn refire_transfers(&mut self, ctx: CtxId, var: VarId) {
        let program = self.program;
        let usage = program.var_usage(var);
        let sites: Vec<StmtSite> = usage
            .invokes
            .iter()
            .chain(&usage.invokes_as_arg)
            .chain(&usage.invokes_as_result)
            .copied()
            .collect();

        for site in sites {
            let Some(cs_site) = self.csm.find_cs_call_site(ctx, site) else {
                continue;
            };
            let edges: Vec<CsCallEdge> = self.cg.edges_of_site(cs_site).to_vec();
            for edge in edges {
                let (_, callee) = self.csm.cs_method_parts(edge.callee);
                let Some(taint) = &self.taint else {
                    return;
                };
                if !taint.has_transfers(callee) {
                    continue;
                }
                let Some(invoke) = program.stmt(site).as_invoke() else {
                    continue;
                };
                taint.apply_transfers(
                    invoke,
                    callee,
                    ctx,
                    self.empty_ctx,
                    &mut self.heap,
                    &mut self.csm,
                    &self.pts,
                    &mut self.worklist,
                );
            }
        }
    }

    /// Freezes the solver state into the published result.
    fn into_result(self) -> PointerAnalysisResult {
        let Self {
            program,
            heap,
            csm,
            pts,
            cg,
            taint,
            ..
        } = self;

        let mut cs_var_pts: IndexMap<(CtxId, VarId), IndexSet<ObjId>> = IndexMap::new();
        let mut var_pts: IndexMap<VarId, IndexSet<ObjId>> = IndexMap::new();
        let mut static_field_pts: IndexMap<crate::ir::FieldId, IndexSet<ObjId>> = IndexMap::new();
        let mut instance_field_pts: IndexMap<(ObjId, crate::ir::FieldId), IndexSet<ObjId>> =
            IndexMap::new();
        let mut array_pts: IndexMap<ObjId, IndexSet<ObjId>> = IndexMap::new();

        for pointer in csm.pointer_ids() {
            let objs: Vec<ObjId> = pts
                .objects(pointer)
                .map(|cs_obj| csm.cs_obj_parts(cs_obj).1)
                .collect();
            if objs.is_empty() {
                continue;
            }
            match csm.pointer_key(pointer) {
                PointerKey::Var(ctx, var) => {
                    cs_var_pts
                        .entry((ctx, var))
                        .or_default()
                        .extend(objs.iter().copied());
                    var_pts.entry(var).or_default().extend(objs.iter().copied());
                }
                PointerKey::InstanceField(cs_obj, field) => {
                    let (_, base) = csm.cs_obj_parts(cs_obj);
                    instance_field_pts
                        .entry((base, field))
                        .or_default()
                        .extend(objs.iter().copied());
                }
                PointerKey::ArrayIndex(cs_obj) => {
                    let (_, base) = csm.cs_obj_parts(cs_obj);
                    array_pts.entry(base).or_default().extend(objs.iter().copied());
                }
                PointerKey::StaticField(field) => {
                    static_field_pts
                        .entry(field)
                        .or_default()
                        .extend(objs.iter().copied());
                }
            }
        }

        let taint_flows = taint
            .as_ref()
            .map(|overlay| overlay.collect_flows(program, &cg, &csm, &heap, &pts))
            .unwrap_or_default();

        let mut call_graph = CallGraph::new();
        for cs_method in cg.reachable_methods() {
            let (_, method) = csm.cs_method_parts(cs_method);
            call_graph.add_reachable(method);
        }
        for edge in cg.edges() {
            let (_, site) = csm.cs_call_site_parts(edge.site);
            let (_, callee) = csm.cs_method_parts(edge.callee);
            call_graph.add_edge(CallEdge {
                kind: edge.kind,
                site,
                callee,
            });
        }

        let obj_kinds = heap.kinds().cloned().collect();

        PointerAnalysisResult {
            contexts: csm.contexts().cloned().collect(),
            obj_kinds,
            cs_var_pts,
            var_pts,
            static_field_pts,
            instance_field_pts,
            array_pts,
            call_graph,
            taint_flows,
        }
    }
}
