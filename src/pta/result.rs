//! The frozen pointer-analysis result.

use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

use crate::graph::CallGraph;
use crate::ir::{FieldId, StmtSite, VarId};
use crate::pta::context::Ctx;
use crate::pta::element::CtxId;
use crate::pta::heap::{ObjId, ObjKind};
use crate::taint::TaintFlow;

/// Everything a pointer-analysis run publishes.
///
/// Built once when the solver's worklist drains, then read-only:
/// context-sensitive and collapsed points-to views, the call graph
/// collapsed over contexts, and the taint flows when the taint overlay
/// was active.
#[derive(Debug)]
pub struct PointerAnalysisResult {
    pub(crate) contexts: Vec<Ctx>,
    pub(crate) obj_kinds: Vec<ObjKind>,
    pub(crate) cs_var_pts: IndexMap<(CtxId, VarId), IndexSet<ObjId>>,
    pub(crate) var_pts: IndexMap<VarId, IndexSet<ObjId>>,
    pub(crate) static_field_pts: IndexMap<FieldId, IndexSet<ObjId>>,
    pub(crate) instance_field_pts: IndexMap<(ObjId, FieldId), IndexSet<ObjId>>,
    pub(crate) array_pts: IndexMap<ObjId, IndexSet<ObjId>>,
    pub(crate) call_graph: CallGraph,
    pub(crate) taint_flows: BTreeSet<TaintFlow>,
}

impl PointerAnalysisResult {
    /// Variables with a non-empty points-to set, in discovery order.
    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.var_pts.keys().copied()
    }

    /// The context-collapsed points-to set of a variable.
    #[must_use]
    pub fn var_points_to(&self, var: VarId) -> Option<&IndexSet<ObjId>> {
        self.var_pts.get(&var)
    }

    /// Iterates all collapsed (variable, points-to) pairs.
    pub fn iter_var_points_to(&self) -> impl Iterator<Item = (VarId, &IndexSet<ObjId>)> {
        self.var_pts.iter().map(|(&var, objs)| (var, objs))
    }

    /// Iterates the context-sensitive view: (context, variable,
    /// points-to set).
    pub fn iter_cs_var_points_to(
        &self,
    ) -> impl Iterator<Item = (&Ctx, VarId, &IndexSet<ObjId>)> {
        self.cs_var_pts
            .iter()
            .map(|(&(ctx, var), objs)| (&self.contexts[ctx.index()], var, objs))
    }

    /// Two variables alias iff their points-to sets intersect.
    #[must_use]
    pub fn is_alias(&self, a: VarId, b: VarId) -> bool {
        let (Some(pa), Some(pb)) = (self.var_pts.get(&a), self.var_pts.get(&b)) else {
            return false;
        };
        pa.intersection(pb).next().is_some()
    }

    /// Points-to set of a static field.
    #[must_use]
    pub fn static_field_points_to(&self, field: FieldId) -> Option<&IndexSet<ObjId>> {
        self.static_field_pts.get(&field)
    }

    /// Points-to set of an instance field of an abstract object.
    #[must_use]
    pub fn instance_field_points_to(
        &self,
        obj: ObjId,
        field: FieldId,
    ) -> Option<&IndexSet<ObjId>> {
        self.instance_field_pts.get(&(obj, field))
    }

    /// Points-to set of the element cell of an array object.
    #[must_use]
    pub fn array_points_to(&self, obj: ObjId) -> Option<&IndexSet<ObjId>> {
        self.array_pts.get(&obj)
    }

    /// What an abstract object stands for.
    #[must_use]
    pub fn obj_kind(&self, obj: ObjId) -> &ObjKind {
        &self.obj_kinds[obj.index()]
    }

    /// The allocation site of an ordinary object.
    #[must_use]
    pub fn alloc_site_of(&self, obj: ObjId) -> Option<StmtSite> {
        match self.obj_kind(obj) {
            ObjKind::Alloc { site, .. } => Some(*site),
            ObjKind::Taint { .. } => None,
        }
    }

    /// The call graph discovered on the fly, collapsed over contexts.
    #[must_use]
    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    /// The taint flows, ordered by source, sink, then argument index.
    /// Empty when no taint configuration was supplied.
    #[must_use]
    pub fn taint_flows(&self) -> &BTreeSet<TaintFlow> {
        &self.taint_flows
    }
}
