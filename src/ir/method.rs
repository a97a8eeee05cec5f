//! Methods, bodies, variables, and per-variable cross-indices.

use crate::ir::stmt::Stmt;
use crate::ir::types::{ClassId, MethodFlags, MethodId, StmtSite, SubsigId, Type, VarId};

/// A method of the program.
///
/// Abstract methods carry no body and are never dispatch targets.
#[derive(Debug)]
pub struct MethodInfo {
    /// Human-readable name (diagnostics only; dispatch uses the
    /// subsignature).
    pub name: String,
    /// The interned subsignature.
    pub subsig: SubsigId,
    /// The declaring class.
    pub class: ClassId,
    /// Modifier flags.
    pub flags: MethodFlags,
    /// Return type.
    pub return_type: Type,
    /// The body, absent for abstract methods.
    pub body: Option<Body>,
}

impl MethodInfo {
    /// Returns `true` if the method is abstract (has no body).
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ABSTRACT)
    }

    /// Returns `true` if the method is static.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::STATIC)
    }
}

/// The ordered statements and variable roles of a concrete method.
#[derive(Debug, Default)]
pub struct Body {
    /// Statements in index order.
    pub stmts: Vec<Stmt>,
    /// Formal parameters in positional order.
    pub params: Vec<VarId>,
    /// The receiver variable for instance methods.
    pub this: Option<VarId>,
    /// Variables returned by `Return` statements.
    pub return_vars: Vec<VarId>,
}

/// A variable of the program.
#[derive(Debug)]
pub struct VarInfo {
    /// Human-readable name.
    pub name: String,
    /// Declared type.
    pub ty: Type,
    /// The owning method.
    pub method: MethodId,
}

/// Cross-indices of one variable, computed when the program is sealed.
///
/// The pointer-analysis and alias-aware solvers consume these instead
/// of rescanning statement lists: given a variable whose points-to set
/// grew, the relevant loads, stores, and calls are at hand.
#[derive(Debug, Default)]
pub struct VarUsage {
    /// Sites of `v.f := x` with this variable as base.
    pub store_fields: Vec<StmtSite>,
    /// Sites of `x := v.f` with this variable as base.
    pub load_fields: Vec<StmtSite>,
    /// Sites of `v[i] := x` with this variable as base.
    pub store_arrays: Vec<StmtSite>,
    /// Sites of `x := v[i]` with this variable as base.
    pub load_arrays: Vec<StmtSite>,
    /// Invocation sites with this variable as receiver.
    pub invokes: Vec<StmtSite>,
    /// Invocation sites with this variable among the arguments.
    pub invokes_as_arg: Vec<StmtSite>,
    /// Invocation sites binding their result to this variable.
    pub invokes_as_result: Vec<StmtSite>,
}
