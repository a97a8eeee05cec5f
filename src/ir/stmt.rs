//! Three-address statements and expressions.
//!
//! Statements are tagged variants matched directly by the analyses; a
//! statement never owns nested statements, and every operand is a
//! variable or literal. Branch targets are statement indices within the
//! owning method body.

use crate::ir::types::{ClassId, FieldId, SubsigId, VarId};

/// Binary operators of the expression language.
///
/// Division and remainder are the only operators whose evaluation can
/// be undefined (constant zero divisor); the comparison operators
/// produce 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition with two's-complement wrap.
    Add,
    /// Subtraction with two's-complement wrap.
    Sub,
    /// Multiplication with two's-complement wrap.
    Mul,
    /// Signed division.
    Div,
    /// Signed remainder.
    Rem,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise xor.
    Xor,
    /// Shift left.
    Shl,
    /// Arithmetic (sign-extending) shift right.
    Shr,
    /// Logical (zero-extending) shift right.
    Ushr,
    /// Equality, produces 0/1.
    Eq,
    /// Inequality, produces 0/1.
    Ne,
    /// Less-than, produces 0/1.
    Lt,
    /// Less-or-equal, produces 0/1.
    Le,
    /// Greater-than, produces 0/1.
    Gt,
    /// Greater-or-equal, produces 0/1.
    Ge,
}

impl BinaryOp {
    /// Returns `true` for division and remainder.
    #[must_use]
    pub const fn is_division(self) -> bool {
        matches!(self, Self::Div | Self::Rem)
    }

    /// Applies the operator to two concrete 32-bit values.
    ///
    /// Returns `None` exactly when the operation is a division or
    /// remainder by zero. Arithmetic wraps; shifts mask the shift
    /// amount to the low five bits as the JVM does.
    #[must_use]
    pub fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        Some(match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            Self::Mul => lhs.wrapping_mul(rhs),
            Self::Div => {
                if rhs == 0 {
                    return None;
                }
                lhs.wrapping_div(rhs)
            }
            Self::Rem => {
                if rhs == 0 {
                    return None;
                }
                lhs.wrapping_rem(rhs)
            }
            Self::And => lhs & rhs,
            Self::Or => lhs | rhs,
            Self::Xor => lhs ^ rhs,
            Self::Shl => lhs.wrapping_shl(rhs as u32),
            Self::Shr => lhs.wrapping_shr(rhs as u32),
            Self::Ushr => (lhs as u32).wrapping_shr(rhs as u32) as i32,
            Self::Eq => i32::from(lhs == rhs),
            Self::Ne => i32::from(lhs != rhs),
            Self::Lt => i32::from(lhs < rhs),
            Self::Le => i32::from(lhs <= rhs),
            Self::Gt => i32::from(lhs > rhs),
            Self::Ge => i32::from(lhs >= rhs),
        })
    }
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exp {
    /// An integer literal.
    IntLiteral(i32),
    /// A variable copy.
    Var(VarId),
    /// A binary operation over two variables.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: VarId,
        /// Right operand.
        rhs: VarId,
    },
}

/// Lexical kind of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    /// Static dispatch on the declared class.
    Static,
    /// Constructor / private / super invocation.
    Special,
    /// Virtual dispatch through the class hierarchy.
    Virtual,
    /// Interface dispatch.
    Interface,
    /// Dynamically computed call site; never resolved statically.
    Dynamic,
}

/// Reference to a method by declaring class and subsignature.
///
/// This is the statically declared target of a call site; actual
/// callees are found by dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodRef {
    /// The declared class or interface.
    pub class: ClassId,
    /// The interned subsignature.
    pub subsig: SubsigId,
}

/// A method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoke {
    /// Variable receiving the return value, if the call binds one.
    pub result: Option<VarId>,
    /// Lexical kind of the call site.
    pub kind: CallKind,
    /// The statically declared target.
    pub callee: MethodRef,
    /// The receiver variable for instance calls.
    pub receiver: Option<VarId>,
    /// Argument variables in positional order.
    pub args: Vec<VarId>,
}

/// A three-address statement.
///
/// Control transfer is expressed through explicit targets (statement
/// indices); everything else falls through to the next statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// No operation.
    Nop,
    /// `lhs := exp`.
    Assign {
        /// Defined variable.
        lhs: VarId,
        /// Right-hand side.
        rhs: Exp,
    },
    /// `lhs := new C`. The statement itself is the allocation site.
    New {
        /// Defined variable.
        lhs: VarId,
        /// Instantiated class.
        class: ClassId,
    },
    /// `lhs := base.field` (instance) or `lhs := C.field` (static,
    /// `base` absent).
    LoadField {
        /// Defined variable.
        lhs: VarId,
        /// Receiver variable; `None` for static fields.
        base: Option<VarId>,
        /// The accessed field.
        field: FieldId,
    },
    /// `base.field := rhs` (instance) or `C.field := rhs` (static).
    StoreField {
        /// Receiver variable; `None` for static fields.
        base: Option<VarId>,
        /// The accessed field.
        field: FieldId,
        /// Stored variable.
        rhs: VarId,
    },
    /// `lhs := base[index]`.
    LoadArray {
        /// Defined variable.
        lhs: VarId,
        /// Array variable.
        base: VarId,
        /// Index variable.
        index: VarId,
    },
    /// `base[index] := rhs`.
    StoreArray {
        /// Array variable.
        base: VarId,
        /// Index variable.
        index: VarId,
        /// Stored variable.
        rhs: VarId,
    },
    /// A method invocation, possibly binding a result.
    Invoke(Invoke),
    /// Conditional branch: taken edge goes to `target`, fall-through
    /// continues at the next statement.
    If {
        /// Comparison operator (one of the condition operators).
        op: BinaryOp,
        /// Left operand.
        lhs: VarId,
        /// Right operand.
        rhs: VarId,
        /// Branch target when the condition holds.
        target: u32,
    },
    /// Multi-way branch on an integer key.
    Switch {
        /// The scrutinized variable.
        key: VarId,
        /// Case value and target pairs.
        cases: Vec<(i32, u32)>,
        /// Target when no case matches.
        default: u32,
    },
    /// Unconditional jump.
    Goto {
        /// Jump target.
        target: u32,
    },
    /// Method return, optionally yielding a value.
    Return {
        /// Returned variable, if any.
        value: Option<VarId>,
    },
}

impl Stmt {
    /// Returns the variable this statement defines, if any.
    #[must_use]
    pub fn def(&self) -> Option<VarId> {
        match self {
            Self::Assign { lhs, .. }
            | Self::New { lhs, .. }
            | Self::LoadField { lhs, .. }
            | Self::LoadArray { lhs, .. } => Some(*lhs),
            Self::Invoke(invoke) => invoke.result,
            _ => None,
        }
    }

    /// Returns the variables this statement uses.
    #[must_use]
    pub fn uses(&self) -> Vec<VarId> {
        match self {
            Self::Nop | Self::New { .. } | Self::Goto { .. } => Vec::new(),
            Self::Assign { rhs, .. } => match rhs {
                Exp::IntLiteral(_) => Vec::new(),
                Exp::Var(v) => vec![*v],
                Exp::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            },
            Self::LoadField { base, .. } => base.iter().copied().collect(),
            Self::StoreField { base, rhs, .. } => {
                base.iter().copied().chain([*rhs]).collect()
            }
            Self::LoadArray { base, index, .. } => vec![*base, *index],
            Self::StoreArray { base, index, rhs } => vec![*base, *index, *rhs],
            Self::Invoke(invoke) => invoke
                .receiver
                .iter()
                .copied()
                .chain(invoke.args.iter().copied())
                .collect(),
            Self::If { lhs, rhs, .. } => vec![*lhs, *rhs],
            Self::Switch { key, .. } => vec![*key],
            Self::Return { value } => value.iter().copied().collect(),
        }
    }

    /// Returns the invocation if this is an invoke statement.
    #[must_use]
    pub fn as_invoke(&self) -> Option<&Invoke> {
        match self {
            Self::Invoke(invoke) => Some(invoke),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_wrapping() {
        assert_eq!(BinaryOp::Add.apply(i32::MAX, 1), Some(i32::MIN));
        assert_eq!(BinaryOp::Mul.apply(1 << 30, 4), Some(0));
        assert_eq!(BinaryOp::Sub.apply(i32::MIN, 1), Some(i32::MAX));
    }

    #[test]
    fn test_apply_division() {
        assert_eq!(BinaryOp::Div.apply(7, 2), Some(3));
        assert_eq!(BinaryOp::Rem.apply(7, 2), Some(1));
        assert_eq!(BinaryOp::Div.apply(7, 0), None);
        assert_eq!(BinaryOp::Rem.apply(7, 0), None);
        // i32::MIN / -1 must not panic
        assert_eq!(BinaryOp::Div.apply(i32::MIN, -1), Some(i32::MIN));
    }

    #[test]
    fn test_apply_shifts() {
        assert_eq!(BinaryOp::Shl.apply(1, 3), Some(8));
        assert_eq!(BinaryOp::Shr.apply(-8, 1), Some(-4));
        assert_eq!(BinaryOp::Ushr.apply(-1, 28), Some(15));
        // shift amounts mask to the low five bits
        assert_eq!(BinaryOp::Shl.apply(1, 33), Some(2));
    }

    #[test]
    fn test_apply_conditions() {
        assert_eq!(BinaryOp::Eq.apply(3, 3), Some(1));
        assert_eq!(BinaryOp::Ne.apply(3, 3), Some(0));
        assert_eq!(BinaryOp::Lt.apply(2, 3), Some(1));
        assert_eq!(BinaryOp::Ge.apply(2, 3), Some(0));
    }

    #[test]
    fn test_uses_and_def() {
        let v = |i| VarId::new(i);
        let s = Stmt::StoreArray {
            base: v(0),
            index: v(1),
            rhs: v(2),
        };
        assert_eq!(s.def(), None);
        assert_eq!(s.uses(), vec![v(0), v(1), v(2)]);

        let s = Stmt::Assign {
            lhs: v(3),
            rhs: Exp::Binary {
                op: BinaryOp::Add,
                lhs: v(0),
                rhs: v(1),
            },
        };
        assert_eq!(s.def(), Some(v(3)));
        assert_eq!(s.uses(), vec![v(0), v(1)]);
    }
}
