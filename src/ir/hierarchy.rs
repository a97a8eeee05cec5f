//! Classes and the class hierarchy.
//!
//! The hierarchy answers the queries dispatch and class-hierarchy
//! analysis need: direct subclasses, direct sub-interfaces, direct
//! implementors, the superclass chain, and declared-method lookup by
//! subsignature.

use indexmap::IndexMap;

use crate::ir::types::{ClassFlags, ClassId, MethodId, SubsigId};

/// A class or interface of the program.
#[derive(Debug)]
pub struct ClassInfo {
    /// Fully qualified name.
    pub name: String,
    /// Direct superclass; `None` for the root class and interfaces
    /// without a declared parent.
    pub superclass: Option<ClassId>,
    /// Directly implemented (for classes) or extended (for interfaces)
    /// interfaces.
    pub interfaces: Vec<ClassId>,
    /// Modifier flags.
    pub flags: ClassFlags,
    /// Declared methods, keyed by subsignature, in declaration order.
    pub declared: IndexMap<SubsigId, MethodId>,
}

impl ClassInfo {
    /// Returns `true` if this type is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }

    /// Returns `true` if this type is abstract.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ClassFlags::ABSTRACT)
    }
}

/// Subtype relations of the whole program, precomputed at seal time.
///
/// Lists preserve declaration order so hierarchy walks are
/// deterministic.
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    /// Direct subclasses of each class.
    subclasses: Vec<Vec<ClassId>>,
    /// Direct sub-interfaces of each interface.
    subinterfaces: Vec<Vec<ClassId>>,
    /// Direct (class) implementors of each interface.
    implementors: Vec<Vec<ClassId>>,
}

impl ClassHierarchy {
    /// Builds the relation tables from the class arena.
    pub(crate) fn build(classes: &[ClassInfo]) -> Self {
        let n = classes.len();
        let mut hierarchy = Self {
            subclasses: vec![Vec::new(); n],
            subinterfaces: vec![Vec::new(); n],
            implementors: vec![Vec::new(); n],
        };
        for (index, class) in classes.iter().enumerate() {
            let id = ClassId::new(index as u32);
            if let Some(superclass) = class.superclass {
                if !class.is_interface() {
                    hierarchy.subclasses[superclass.index()].push(id);
                }
            }
            for &interface in &class.interfaces {
                if class.is_interface() {
                    hierarchy.subinterfaces[interface.index()].push(id);
                } else {
                    hierarchy.implementors[interface.index()].push(id);
                }
            }
        }
        hierarchy
    }

    /// Direct subclasses of `class`, in declaration order.
    #[must_use]
    pub fn direct_subclasses(&self, class: ClassId) -> &[ClassId] {
        &self.subclasses[class.index()]
    }

    /// Direct sub-interfaces of `interface`, in declaration order.
    #[must_use]
    pub fn direct_subinterfaces(&self, interface: ClassId) -> &[ClassId] {
        &self.subinterfaces[interface.index()]
    }

    /// Direct class implementors of `interface`, in declaration order.
    #[must_use]
    pub fn direct_implementors(&self, interface: ClassId) -> &[ClassId] {
        &self.implementors[interface.index()]
    }
}
