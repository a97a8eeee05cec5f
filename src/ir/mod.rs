//! The program model every analysis consumes.
//!
//! Programs arrive already lowered: classes with declared methods,
//! method bodies as ordered three-address statements, and variables
//! with declared types. This module defines that model plus the
//! [`ProgramBuilder`] embedders use to construct it in memory; there is
//! no parser here.
//!
//! # Components
//!
//! - [`Program`] / [`ProgramBuilder`] - the sealed arena and its
//!   construction surface
//! - [`Stmt`] / [`Exp`] / [`BinaryOp`] - three-address statements and
//!   expressions
//! - [`ClassInfo`] / [`ClassHierarchy`] - types and subtype relations
//! - [`MethodInfo`] / [`Body`] / [`VarUsage`] - methods and the
//!   per-variable cross-indices the solvers iterate

mod hierarchy;
mod method;
mod program;
mod stmt;
mod types;

pub use hierarchy::{ClassHierarchy, ClassInfo};
pub use method::{Body, MethodInfo, VarInfo, VarUsage};
pub use program::{FieldInfo, Program, ProgramBuilder};
pub use stmt::{BinaryOp, CallKind, Exp, Invoke, MethodRef, Stmt};
pub use types::{ClassFlags, ClassId, FieldId, MethodFlags, MethodId, StmtSite, SubsigId, Type, VarId};
