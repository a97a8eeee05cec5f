//! Identities, types, and modifier flags of the program model.
//!
//! Every entity of the model (class, field, method, variable) is
//! referred to by a dense integer id into the owning [`crate::ir::Program`]
//! arenas. Statements are identified by their [`StmtSite`], the pair of
//! owning method and statement index; sites order by method then index,
//! which is the order result sets are reported in.

use bitflags::bitflags;

/// Identity of a class or interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

/// Identity of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

/// Identity of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

/// Identity of a variable.
///
/// Variables are registered globally; each belongs to exactly one
/// method (or is a static-initializer temp of the program).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

/// Interned method subsignature (name plus parameter descriptor).
///
/// Dispatch compares subsignatures, never method identities: two
/// methods in different classes with the same subsignature override
/// one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubsigId(u32);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            /// Creates an id from a raw index.
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw index of this id.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

impl_id!(ClassId);
impl_id!(FieldId);
impl_id!(MethodId);
impl_id!(VarId);
impl_id!(SubsigId);

/// Identity of a statement: the owning method plus the statement's
/// index in that method's body.
///
/// The derived ordering (method, then index) is the deterministic
/// order used for dead-code sets and taint flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtSite {
    /// The method owning the statement.
    pub method: MethodId,
    /// Index of the statement in the method body.
    pub index: u32,
}

impl StmtSite {
    /// Creates a statement site.
    #[must_use]
    pub const fn new(method: MethodId, index: u32) -> Self {
        Self { method, index }
    }
}

/// A type in the program model.
///
/// Reference types point at a class in the hierarchy; array types wrap
/// their element type. The primitive set mirrors the integer-like
/// distinctions the constant-propagation lattice cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The absence of a value (method return position only).
    Void,
    /// Boolean, modelled as 0/1 in the integer lattice.
    Boolean,
    /// 8-bit signed integer.
    Byte,
    /// 16-bit signed integer.
    Short,
    /// 16-bit unsigned character.
    Char,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer. Not tracked by the constant lattice.
    Long,
    /// A class or interface reference.
    Reference(ClassId),
    /// An array of the given element type.
    Array(Box<Type>),
}

impl Type {
    /// Returns `true` if a variable of this type can hold an integer
    /// value tracked by the constant lattice.
    ///
    /// Covers byte, short, int, char, and boolean. `long` is excluded:
    /// the lattice carries 32-bit constants only.
    #[must_use]
    pub fn can_hold_int(&self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Byte | Self::Short | Self::Char | Self::Int
        )
    }

    /// Returns the class behind a reference type, if any.
    #[must_use]
    pub fn as_class(&self) -> Option<ClassId> {
        match self {
            Self::Reference(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns `true` for reference and array types.
    #[must_use]
    pub fn is_reference_like(&self) -> bool {
        matches!(self, Self::Reference(_) | Self::Array(_))
    }
}

bitflags! {
    /// Modifier flags of a class or interface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClassFlags: u8 {
        /// The type is an interface.
        const INTERFACE = 0x01;
        /// The type is abstract and cannot be instantiated.
        const ABSTRACT = 0x02;
    }
}

bitflags! {
    /// Modifier flags of a method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MethodFlags: u8 {
        /// The method is static (no receiver).
        const STATIC = 0x01;
        /// The method is abstract (no body, never a dispatch target).
        const ABSTRACT = 0x02;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_hold_int() {
        assert!(Type::Int.can_hold_int());
        assert!(Type::Boolean.can_hold_int());
        assert!(Type::Byte.can_hold_int());
        assert!(Type::Short.can_hold_int());
        assert!(Type::Char.can_hold_int());
        assert!(!Type::Long.can_hold_int());
        assert!(!Type::Void.can_hold_int());
        assert!(!Type::Reference(ClassId::new(0)).can_hold_int());
        assert!(!Type::Array(Box::new(Type::Int)).can_hold_int());
    }

    #[test]
    fn test_site_ordering() {
        let m0 = MethodId::new(0);
        let m1 = MethodId::new(1);
        assert!(StmtSite::new(m0, 5) < StmtSite::new(m1, 0));
        assert!(StmtSite::new(m0, 1) < StmtSite::new(m0, 2));
    }
}
