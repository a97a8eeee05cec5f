//! Dead-code detection.
//!
//! Two passes over one method, producing a single ordered set of dead
//! statements:
//!
//! 1. **Reachability.** A breadth-first walk from the CFG entry that
//!    refuses to follow branch edges ruled out by constant
//!    propagation: the untaken side of an `If` with a constant
//!    condition and the unmatched cases of a `Switch` with a constant
//!    key. Whatever the walk never visits is unreachable.
//! 2. **Useless assignments.** A visited `x := rhs` is dead when `rhs`
//!    has no observable side effect and `x` is not live after the
//!    statement.

use std::collections::{BTreeSet, VecDeque};

use crate::dataflow::constprop::ConstantPropagation;
use crate::dataflow::lattice::Value;
use crate::dataflow::liveness::LiveVariableAnalysis;
use crate::dataflow::solver::WorklistSolver;
use crate::graph::{CfgBuilder, CfgNodeId, EdgeKind};
use crate::ir::{BinaryOp, Exp, MethodId, Program, Stmt, StmtSite};

/// Detects unreachable and useless statements in one method.
pub struct DeadCodeDetection;

impl DeadCodeDetection {
    /// Runs both passes and returns the dead statements, ordered by
    /// statement index.
    #[must_use]
    pub fn analyze(program: &Program, method: MethodId) -> BTreeSet<StmtSite> {
        let body = program.body(method).expect("concrete method");
        let cfg = CfgBuilder::build(program, method);

        let cp = ConstantPropagation::new(program, method);
        let constants = WorklistSolver::new(&cp).solve(&cfg);
        let lv = LiveVariableAnalysis::new(program, method);
        let live = WorklistSolver::new(&lv).solve(&cfg);

        let mut dead: BTreeSet<StmtSite> = BTreeSet::new();
        let mut visited = vec![false; cfg.node_count()];
        let mut queue = VecDeque::new();

        visited[cfg.entry().index()] = true;
        queue.push_back(cfg.entry());

        while let Some(node) = queue.pop_front() {
            let stmt = node.as_stmt().map(|index| &body.stmts[index as usize]);

            if let (Some(index), Some(stmt)) = (node.as_stmt(), stmt) {
                if let Stmt::Assign { lhs, rhs } = stmt {
                    if Self::has_no_side_effect(rhs)
                        && !live.out_fact(node).contains(lhs)
                    {
                        dead.insert(StmtSite::new(method, index));
                    }
                }
            }

            for edge in cfg.out_edges_of(node) {
                if visited[edge.target.index()] {
                    continue;
                }

                if let Some(stmt) = stmt {
                    match stmt {
                        Stmt::If { op, lhs, rhs, .. } => {
                            let cond = Exp::Binary {
                                op: *op,
                                lhs: *lhs,
                                rhs: *rhs,
                            };
                            let value =
                                ConstantPropagation::evaluate(program, &cond, constants.in_fact(node));
                            if value == Value::Const(1) && edge.kind == EdgeKind::IfFalse {
                                continue;
                            }
                            if value == Value::Const(0) && edge.kind == EdgeKind::IfTrue {
                                continue;
                            }
                        }
                        Stmt::Switch { key, cases, .. } => {
                            let value = ConstantPropagation::evaluate(
                                program,
                                &Exp::Var(*key),
                                constants.in_fact(node),
                            );
                            if let Some(k) = value.as_constant() {
                                match edge.kind {
                                    EdgeKind::SwitchCase(case) if case != k => continue,
                                    EdgeKind::SwitchDefault
                                        if cases.iter().any(|(case, _)| *case == k) =>
                                    {
                                        continue
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }

                visited[edge.target.index()] = true;
                queue.push_back(edge.target);
            }
        }

        for (index, _) in body.stmts.iter().enumerate() {
            let node = CfgNodeId::stmt(index as u32);
            if !visited[node.index()] {
                dead.insert(StmtSite::new(method, index as u32));
            }
        }

        dead
    }

    /// Returns `true` if evaluating the expression cannot be observed:
    /// allocations, field and array accesses are modelled as separate
    /// statements, so only division and remainder (which can trap)
    /// make an assignment's RHS impure.
    fn has_no_side_effect(exp: &Exp) -> bool {
        !matches!(
            exp,
            Exp::Binary {
                op: BinaryOp::Div | BinaryOp::Rem,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Body, ClassFlags, MethodFlags, ProgramBuilder, Type};

    /// x := 1; y := x / z  -- y unused but division is impure
    #[test]
    fn test_division_is_never_useless() {
        let mut pb = ProgramBuilder::new();
        let object = pb.add_class("Object", None, &[], ClassFlags::empty());
        let m = pb.add_method(object, "m", "m()", MethodFlags::STATIC, Type::Void);
        let x = pb.add_var(m, "x", Type::Int);
        let y = pb.add_var(m, "y", Type::Int);
        let z = pb.add_var(m, "z", Type::Int);
        pb.set_body(
            m,
            Body {
                stmts: vec![
                    Stmt::Assign {
                        lhs: x,
                        rhs: Exp::IntLiteral(1),
                    },
                    Stmt::Assign {
                        lhs: y,
                        rhs: Exp::Binary {
                            op: BinaryOp::Div,
                            lhs: x,
                            rhs: z,
                        },
                    },
                    Stmt::Return { value: None },
                ],
                ..Body::default()
            },
        );
        pb.set_entry(m);
        let program = pb.finish().unwrap();

        let dead = DeadCodeDetection::analyze(&program, m);
        // x := 1 is live into the division; y := x / z is impure:
        // neither is dead
        assert!(dead.is_empty());
    }

    /// a := 1; b := a (b unused) -- the copy into b is useless
    #[test]
    fn test_useless_assignment() {
        let mut pb = ProgramBuilder::new();
        let object = pb.add_class("Object", None, &[], ClassFlags::empty());
        let m = pb.add_method(object, "m", "m()", MethodFlags::STATIC, Type::Int);
        let a = pb.add_var(m, "a", Type::Int);
        let b = pb.add_var(m, "b", Type::Int);
        pb.set_body(
            m,
            Body {
                stmts: vec![
                    Stmt::Assign {
                        lhs: a,
                        rhs: Exp::IntLiteral(1),
                    },
                    Stmt::Assign {
                        lhs: b,
                        rhs: Exp::Var(a),
                    },
                    Stmt::Return { value: Some(a) },
                ],
                return_vars: vec![a],
                ..Body::default()
            },
        );
        pb.set_entry(m);
        let program = pb.finish().unwrap();

        let dead = DeadCodeDetection::analyze(&program, m);
        assert_eq!(
            dead.into_iter().collect::<Vec<_>>(),
            vec![StmtSite::new(m, 1)]
        );
    }
}
