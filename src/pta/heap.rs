//! The allocation-site heap model.
//!
//! Heap objects are identified by their allocation site; a second,
//! distinguished population of taint objects is identified by (source
//! call, type) and minted only by the taint overlay. Both intern to
//! dense [`ObjId`]s.

use indexmap::IndexSet;

use crate::ir::{ClassId, StmtSite, Type};

/// Identity of an abstract heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u32);

impl ObjId {
    /// Returns the dense index of this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// What an abstract object stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjKind {
    /// All objects allocated at one `new` statement.
    Alloc {
        /// The allocation site.
        site: StmtSite,
        /// The instantiated class.
        class: ClassId,
    },
    /// A synthetic object standing for any value derived from a taint
    /// source.
    Taint {
        /// The source call that introduced the taint.
        source: StmtSite,
        /// The type the taint currently flows at.
        ty: Type,
    },
}

/// Interns abstract objects to dense ids.
#[derive(Debug, Default)]
pub struct HeapModel {
    objs: IndexSet<ObjKind>,
}

impl HeapModel {
    /// Creates an empty heap model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The object of an allocation site.
    pub fn alloc_obj(&mut self, site: StmtSite, class: ClassId) -> ObjId {
        let (index, _) = self.objs.insert_full(ObjKind::Alloc { site, class });
        ObjId(index as u32)
    }

    /// The taint object of a (source call, type) pair.
    pub fn taint_obj(&mut self, source: StmtSite, ty: Type) -> ObjId {
        let (index, _) = self.objs.insert_full(ObjKind::Taint { source, ty });
        ObjId(index as u32)
    }

    /// The kind of an object.
    #[must_use]
    pub fn kind(&self, obj: ObjId) -> &ObjKind {
        self.objs.get_index(obj.index()).expect("interned object")
    }

    /// The dynamic class of an object, used to dispatch instance
    /// calls on it. Taint objects of non-reference type have none.
    #[must_use]
    pub fn class_of(&self, obj: ObjId) -> Option<ClassId> {
        match self.kind(obj) {
            ObjKind::Alloc { class, .. } => Some(*class),
            ObjKind::Taint { ty, .. } => ty.as_class(),
        }
    }

    /// Returns `true` if the object is a taint object.
    #[must_use]
    pub fn is_taint(&self, obj: ObjId) -> bool {
        matches!(self.kind(obj), ObjKind::Taint { .. })
    }

    /// The source call of a taint object.
    #[must_use]
    pub fn taint_source(&self, obj: ObjId) -> Option<StmtSite> {
        match self.kind(obj) {
            ObjKind::Taint { source, .. } => Some(*source),
            ObjKind::Alloc { .. } => None,
        }
    }

    /// The allocation site of an ordinary object.
    #[must_use]
    pub fn alloc_site(&self, obj: ObjId) -> Option<StmtSite> {
        match self.kind(obj) {
            ObjKind::Alloc { site, .. } => Some(*site),
            ObjKind::Taint { .. } => None,
        }
    }

    /// Iterates every interned object kind, in id order.
    pub fn kinds(&self) -> impl Iterator<Item = &ObjKind> {
        self.objs.iter()
    }

    /// Number of interned objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    /// Returns `true` if no object was interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }
}

/// Builds an object id directly; unit-test seam.
#[cfg(test)]
pub(crate) fn test_obj(index: u32) -> ObjId {
    ObjId(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::MethodId;

    #[test]
    fn test_interning_is_stable() {
        let mut heap = HeapModel::new();
        let site = StmtSite::new(MethodId::new(0), 3);
        let class = ClassId::new(1);

        let a = heap.alloc_obj(site, class);
        let b = heap.alloc_obj(site, class);
        assert_eq!(a, b);
        assert_eq!(heap.len(), 1);

        let t = heap.taint_obj(site, Type::Int);
        assert_ne!(a, t);
        assert!(heap.is_taint(t));
        assert!(!heap.is_taint(a));
        assert_eq!(heap.taint_source(t), Some(site));
        assert_eq!(heap.alloc_site(a), Some(site));
    }
}
