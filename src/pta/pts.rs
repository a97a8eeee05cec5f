//! Points-to sets and the per-pointer store.
//!
//! Sets only grow over a solver run and iterate in insertion order,
//! which the determinism guarantee depends on.

use indexmap::IndexSet;

use crate::pta::element::{CsObjId, PointerId};

/// A set of context-tagged abstract objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToSet {
    objs: IndexSet<CsObjId>,
}

impl PointsToSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a singleton set.
    #[must_use]
    pub fn single(obj: CsObjId) -> Self {
        let mut set = Self::new();
        set.add(obj);
        set
    }

    /// Adds an object. Returns `true` if it was new.
    pub fn add(&mut self, obj: CsObjId) -> bool {
        self.objs.insert(obj)
    }

    /// Returns `true` if the object is in the set.
    #[must_use]
    pub fn contains(&self, obj: CsObjId) -> bool {
        self.objs.contains(&obj)
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = CsObjId> + '_ {
        self.objs.iter().copied()
    }
}

/// The per-pointer points-to sets, indexed by dense pointer id.
///
/// Grows lazily as pointers are interned; a pointer that was never
/// written has the empty set.
#[derive(Debug, Default)]
pub struct PointsToStore {
    sets: Vec<PointsToSet>,
}

impl PointsToStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The set of a pointer, creating it on first access.
    pub fn ensure(&mut self, ptr: PointerId) -> &mut PointsToSet {
        if ptr.index() >= self.sets.len() {
            self.sets.resize_with(ptr.index() + 1, PointsToSet::new);
        }
        &mut self.sets[ptr.index()]
    }

    /// The set of a pointer, if it was ever touched.
    #[must_use]
    pub fn get(&self, ptr: PointerId) -> Option<&PointsToSet> {
        self.sets.get(ptr.index())
    }

    /// Iterates the objects of a pointer (empty when untouched).
    pub fn objects(&self, ptr: PointerId) -> impl Iterator<Item = CsObjId> + '_ {
        self.get(ptr).into_iter().flat_map(PointsToSet::iter)
    }

    /// Returns `true` if the pointer's set is non-empty.
    #[must_use]
    pub fn is_nonempty(&self, ptr: PointerId) -> bool {
        self.get(ptr).is_some_and(|set| !set.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(mgr: &mut crate::pta::element::CsManager, index: u32) -> CsObjId {
        use crate::pta::context::Ctx;
        let ctx = mgr.ctx(Ctx::empty());
        mgr.cs_obj(ctx, crate::pta::heap::test_obj(index))
    }

    #[test]
    fn test_sets_grow_monotonically() {
        let mut mgr = crate::pta::element::CsManager::new();
        let a = obj(&mut mgr, 0);

        let mut set = PointsToSet::new();
        assert!(set.add(a));
        assert!(!set.add(a));
        assert_eq!(set.len(), 1);
        assert!(set.contains(a));
    }

    #[test]
    fn test_store_untouched_pointer_is_empty() {
        let mut mgr = crate::pta::element::CsManager::new();
        let ctx = mgr.ctx(crate::pta::context::Ctx::empty());
        let ptr = mgr.var_ptr(ctx, crate::ir::VarId::new(0));

        let store = PointsToStore::new();
        assert!(store.get(ptr).is_none());
        assert_eq!(store.objects(ptr).count(), 0);
        assert!(!store.is_nonempty(ptr));
    }
}
