//! Lattice values and fact types.
//!
//! The integer constant lattice has three levels: `Undef` (no value
//! observed yet), `Const(n)` (exactly one value observed), and `Nac`
//! (conflicting values, "not a constant"). Meet moves down:
//! `Undef ⊏ Const(n) ⊏ Nac`, `Nac` absorbs, `Undef` is the identity,
//! and two different constants meet to `Nac`.

use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

use crate::ir::VarId;

/// An element of the integer constant lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// No value has reached this point (top).
    Undef,
    /// Exactly this constant reaches this point.
    Const(i32),
    /// Conflicting values reach this point (bottom).
    Nac,
}

impl Value {
    /// Creates a constant lattice value.
    #[must_use]
    pub const fn make_constant(value: i32) -> Self {
        Self::Const(value)
    }

    /// Returns `true` for `Undef`.
    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }

    /// Returns `true` for a constant.
    #[must_use]
    pub const fn is_constant(self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Returns `true` for `Nac`.
    #[must_use]
    pub const fn is_nac(self) -> bool {
        matches!(self, Self::Nac)
    }

    /// Returns the constant behind this value, if it is one.
    #[must_use]
    pub const fn as_constant(self) -> Option<i32> {
        match self {
            Self::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Meets two lattice values.
    ///
    /// `Nac` absorbs, `Undef` is the identity, and two constants meet
    /// to themselves when equal, `Nac` otherwise.
    #[must_use]
    pub fn meet(self, other: Self) -> Self {
        match (self, other) {
            (Self::Nac, _) | (_, Self::Nac) => Self::Nac,
            (Self::Undef, v) | (v, Self::Undef) => v,
            (Self::Const(a), Self::Const(b)) => {
                if a == b {
                    Self::Const(a)
                } else {
                    Self::Nac
                }
            }
        }
    }
}

/// A constant-propagation fact: variable to lattice value.
///
/// An absent key denotes `Undef`; the map is kept canonical by never
/// storing `Undef` explicitly, so structural equality coincides with
/// pointwise lattice equality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpFact {
    map: IndexMap<VarId, Value>,
}

impl CpFact {
    /// Creates an empty fact (every variable `Undef`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value bound to a variable, `Undef` when absent.
    #[must_use]
    pub fn get(&self, var: VarId) -> Value {
        self.map.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Binds a variable to a value. Returns `true` if the fact
    /// changed. Binding `Undef` removes the key.
    pub fn update(&mut self, var: VarId, value: Value) -> bool {
        match value {
            Value::Undef => self.map.shift_remove(&var).is_some(),
            _ => self.map.insert(var, value) != Some(value),
        }
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Pointwise meet of `other` into `self`.
    pub fn meet_with(&mut self, other: &Self) {
        for (&var, &value) in &other.map {
            let merged = self.get(var).meet(value);
            self.update(var, merged);
        }
    }

    /// Number of non-`Undef` bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if every variable is `Undef`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates the explicit bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, Value)> + '_ {
        self.map.iter().map(|(&var, &value)| (var, value))
    }
}

/// A set-lattice fact, used by live-variable analysis.
///
/// Meet is union; insertion order is preserved for deterministic
/// iteration, while equality is order-independent.
#[derive(Debug, Clone, PartialEq)]
pub struct SetFact<T: Hash + Eq> {
    items: IndexSet<T>,
}

impl<T: Hash + Eq + Clone> SetFact<T> {
    /// Creates an empty set fact.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }

    /// Returns `true` if the item is in the set.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Adds an item. Returns `true` if it was new.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    /// Removes an item. Returns `true` if it was present.
    pub fn remove(&mut self, item: &T) -> bool {
        self.items.shift_remove(item)
    }

    /// Unions `other` into `self`.
    pub fn union_with(&mut self, other: &Self) {
        for item in &other.items {
            self.items.insert(item.clone());
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Hash + Eq + Clone> Default for SetFact<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meet_table() {
        let c1 = Value::make_constant(1);
        let c2 = Value::make_constant(2);

        // Nac absorbs
        assert_eq!(Value::Nac.meet(c1), Value::Nac);
        assert_eq!(c1.meet(Value::Nac), Value::Nac);
        assert_eq!(Value::Nac.meet(Value::Undef), Value::Nac);

        // Undef is identity
        assert_eq!(Value::Undef.meet(c1), c1);
        assert_eq!(c1.meet(Value::Undef), c1);
        assert_eq!(Value::Undef.meet(Value::Undef), Value::Undef);

        // constants
        assert_eq!(c1.meet(c1), c1);
        assert_eq!(c1.meet(c2), Value::Nac);
    }

    #[test]
    fn test_meet_laws() {
        let values = [Value::Undef, Value::Const(1), Value::Const(2), Value::Nac];
        for a in values {
            // idempotent
            assert_eq!(a.meet(a), a);
            for b in values {
                // commutative
                assert_eq!(a.meet(b), b.meet(a));
                for c in values {
                    // associative
                    assert_eq!(a.meet(b).meet(c), a.meet(b.meet(c)));
                }
            }
        }
    }

    #[test]
    fn test_fact_absent_is_undef() {
        let mut fact = CpFact::new();
        let v = VarId::new(0);
        assert_eq!(fact.get(v), Value::Undef);

        assert!(fact.update(v, Value::Const(3)));
        assert_eq!(fact.get(v), Value::Const(3));

        // storing Undef removes the binding and keeps the fact canonical
        assert!(fact.update(v, Value::Undef));
        assert!(fact.is_empty());
        assert_eq!(fact, CpFact::new());
    }

    #[test]
    fn test_fact_meet_with() {
        let v0 = VarId::new(0);
        let v1 = VarId::new(1);

        let mut a = CpFact::new();
        a.update(v0, Value::Const(1));

        let mut b = CpFact::new();
        b.update(v0, Value::Const(2));
        b.update(v1, Value::Const(5));

        a.meet_with(&b);
        assert_eq!(a.get(v0), Value::Nac);
        assert_eq!(a.get(v1), Value::Const(5));
    }

    #[test]
    fn test_set_fact_union() {
        let mut a = SetFact::new();
        a.insert(VarId::new(0));
        let mut b = SetFact::new();
        b.insert(VarId::new(1));
        b.insert(VarId::new(0));

        a.union_with(&b);
        assert_eq!(a.len(), 2);
        assert!(a.contains(&VarId::new(1)));
    }
}
