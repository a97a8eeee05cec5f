//! Intraprocedural constant propagation for integer variables.
//!
//! Each integer-like variable is tracked through the three-level
//! lattice of [`Value`]. Formal parameters start at `Nac` (the caller
//! is unknown), literals introduce constants, and the evaluator folds
//! binary expressions over concrete 32-bit semantics.

use crate::dataflow::framework::DataflowAnalysis;
use crate::dataflow::lattice::{CpFact, Value};
use crate::graph::{Cfg, CfgNodeId};
use crate::ir::{Exp, MethodId, Program, Stmt};

/// Constant propagation over one method.
pub struct ConstantPropagation<'p> {
    program: &'p Program,
    method: MethodId,
}

impl<'p> ConstantPropagation<'p> {
    /// Creates the analysis for `method`.
    #[must_use]
    pub fn new(program: &'p Program, method: MethodId) -> Self {
        Self { program, method }
    }

    /// Evaluates an expression against a fact.
    ///
    /// Pure and total. Variables that cannot hold an integer evaluate
    /// to `Nac`; dividing or taking the remainder by a constant zero
    /// yields `Undef` regardless of the dividend, since the execution
    /// deterministically traps before producing a value.
    #[must_use]
    pub fn evaluate(program: &Program, exp: &Exp, input: &CpFact) -> Value {
        match exp {
            Exp::IntLiteral(value) => Value::make_constant(*value),
            Exp::Var(var) => {
                if program.can_hold_int(*var) {
                    input.get(*var)
                } else {
                    Value::Nac
                }
            }
            Exp::Binary { op, lhs, rhs } => {
                if !program.can_hold_int(*lhs) || !program.can_hold_int(*rhs) {
                    return Value::Nac;
                }
                let left = input.get(*lhs);
                let right = input.get(*rhs);
                if op.is_division() && right == Value::Const(0) {
                    return Value::Undef;
                }
                match (left, right) {
                    (Value::Const(a), Value::Const(b)) => {
                        op.apply(a, b).map_or(Value::Undef, Value::make_constant)
                    }
                    (Value::Nac, _) | (_, Value::Nac) => Value::Nac,
                    _ => Value::Undef,
                }
            }
        }
    }

    /// The transfer function of a single statement.
    ///
    /// Shared with the interprocedural analysis, whose non-heap
    /// statements behave identically. `stmt` is `None` for synthetic
    /// entry/exit nodes, which pass the fact through unchanged.
    pub(crate) fn transfer_stmt(
        program: &Program,
        stmt: Option<&Stmt>,
        input: &CpFact,
        output: &mut CpFact,
    ) -> bool {
        let mut new_out = input.clone();
        if let Some(stmt) = stmt {
            if let Some(lhs) = stmt.def() {
                if program.can_hold_int(lhs) {
                    let value = match stmt {
                        Stmt::Assign { rhs, .. } => Self::evaluate(program, rhs, input),
                        // loads, invokes, and allocations are opaque
                        _ => Value::Nac,
                    };
                    new_out.update(lhs, value);
                }
            }
        }
        let changed = new_out != *output;
        *output = new_out;
        changed
    }
}

impl DataflowAnalysis for ConstantPropagation<'_> {
    type Fact = CpFact;

    fn is_forward(&self) -> bool {
        true
    }

    fn new_boundary_fact(&self, _cfg: &Cfg) -> CpFact {
        let mut fact = CpFact::new();
        if let Some(body) = self.program.body(self.method) {
            for &param in &body.params {
                if self.program.can_hold_int(param) {
                    fact.update(param, Value::Nac);
                }
            }
        }
        fact
    }

    fn new_initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        target.meet_with(fact);
    }

    fn transfer_node(&self, node: CfgNodeId, input: &CpFact, output: &mut CpFact) -> bool {
        let body = self.program.body(self.method).expect("concrete method");
        let stmt = node.as_stmt().map(|index| &body.stmts[index as usize]);
        Self::transfer_stmt(self.program, stmt, input, output)
    }
}
