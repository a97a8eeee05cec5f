//! Context-sensitive elements and their interning.
//!
//! Every (context, entity) pair the solver touches is interned to a
//! dense id by the [`CsManager`]: contexts, context-tagged objects,
//! pointers, methods, and call sites. The pointer flow graph and the
//! points-to store operate purely on these ids, so the hot loops never
//! hash a composite key twice.

use indexmap::IndexSet;

use crate::ir::{FieldId, MethodId, StmtSite, VarId};
use crate::pta::context::Ctx;
use crate::pta::heap::ObjId;

/// Interned context id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CtxId(u32);

/// Interned (context, object) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsObjId(u32);

/// Interned pointer id: a node of the pointer flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(u32);

/// Interned (context, method) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsMethodId(u32);

/// Interned (context, call site) id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsCallSiteId(u32);

impl PointerId {
    /// Returns the dense index of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl CtxId {
    /// Returns the dense index of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a pointer stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKey {
    /// A variable under a context.
    Var(CtxId, VarId),
    /// An instance field of a context-tagged object.
    InstanceField(CsObjId, FieldId),
    /// The element cell of a context-tagged array object.
    ArrayIndex(CsObjId),
    /// A static field.
    StaticField(FieldId),
}

/// Interns contexts, objects, pointers, methods, and call sites.
#[derive(Debug, Default)]
pub struct CsManager {
    contexts: IndexSet<Ctx>,
    cs_objs: IndexSet<(CtxId, ObjId)>,
    pointers: IndexSet<PointerKey>,
    cs_methods: IndexSet<(CtxId, MethodId)>,
    cs_call_sites: IndexSet<(CtxId, StmtSite)>,
}

impl CsManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a context.
    pub fn ctx(&mut self, ctx: Ctx) -> CtxId {
        let (index, _) = self.contexts.insert_full(ctx);
        CtxId(index as u32)
    }

    /// The context behind an id.
    #[must_use]
    pub fn ctx_of(&self, id: CtxId) -> &Ctx {
        self.contexts.get_index(id.0 as usize).expect("interned context")
    }

    /// Interns a (context, object) pair.
    pub fn cs_obj(&mut self, ctx: CtxId, obj: ObjId) -> CsObjId {
        let (index, _) = self.cs_objs.insert_full((ctx, obj));
        CsObjId(index as u32)
    }

    /// The (context, object) pair behind an id.
    #[must_use]
    pub fn cs_obj_parts(&self, id: CsObjId) -> (CtxId, ObjId) {
        *self.cs_objs.get_index(id.0 as usize).expect("interned object")
    }

    /// Interns the pointer of a variable under a context.
    pub fn var_ptr(&mut self, ctx: CtxId, var: VarId) -> PointerId {
        self.pointer(PointerKey::Var(ctx, var))
    }

    /// Interns the pointer of an instance field.
    pub fn instance_field_ptr(&mut self, obj: CsObjId, field: FieldId) -> PointerId {
        self.pointer(PointerKey::InstanceField(obj, field))
    }

    /// Interns the pointer of an array cell.
    pub fn array_ptr(&mut self, obj: CsObjId) -> PointerId {
        self.pointer(PointerKey::ArrayIndex(obj))
    }

    /// Interns the pointer of a static field.
    pub fn static_field_ptr(&mut self, field: FieldId) -> PointerId {
        self.pointer(PointerKey::StaticField(field))
    }

    fn pointer(&mut self, key: PointerKey) -> PointerId {
        let (index, _) = self.pointers.insert_full(key);
        PointerId(index as u32)
    }

    /// The key behind a pointer id.
    #[must_use]
    pub fn pointer_key(&self, id: PointerId) -> PointerKey {
        *self.pointers.get_index(id.index()).expect("interned pointer")
    }

    /// Looks up a variable pointer without interning it.
    #[must_use]
    pub fn find_var_ptr(&self, ctx: CtxId, var: VarId) -> Option<PointerId> {
        self.pointers
            .get_index_of(&PointerKey::Var(ctx, var))
            .map(|index| PointerId(index as u32))
    }

    /// Looks up a (context, call site) pair without interning it.
    #[must_use]
    pub fn find_cs_call_site(&self, ctx: CtxId, site: StmtSite) -> Option<CsCallSiteId> {
        self.cs_call_sites
            .get_index_of(&(ctx, site))
            .map(|index| CsCallSiteId(index as u32))
    }

    /// Iterates all interned contexts in creation order.
    pub fn contexts(&self) -> impl Iterator<Item = &Ctx> {
        self.contexts.iter()
    }

    /// Number of interned pointers.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Iterates every interned pointer id in creation order.
    pub fn pointer_ids(&self) -> impl Iterator<Item = PointerId> {
        (0..self.pointers.len() as u32).map(PointerId)
    }

    /// Interns a (context, method) pair.
    pub fn cs_method(&mut self, ctx: CtxId, method: MethodId) -> CsMethodId {
        let (index, _) = self.cs_methods.insert_full((ctx, method));
        CsMethodId(index as u32)
    }

    /// The (context, method) pair behind an id.
    #[must_use]
    pub fn cs_method_parts(&self, id: CsMethodId) -> (CtxId, MethodId) {
        *self.cs_methods.get_index(id.0 as usize).expect("interned method")
    }

    /// Interns a (context, call site) pair.
    pub fn cs_call_site(&mut self, ctx: CtxId, site: StmtSite) -> CsCallSiteId {
        let (index, _) = self.cs_call_sites.insert_full((ctx, site));
        CsCallSiteId(index as u32)
    }

    /// The (context, call site) pair behind an id.
    #[must_use]
    pub fn cs_call_site_parts(&self, id: CsCallSiteId) -> (CtxId, StmtSite) {
        *self
            .cs_call_sites
            .get_index(id.0 as usize)
            .expect("interned call site")
    }
}
