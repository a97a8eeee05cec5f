//! Per-method control-flow graphs.
//!
//! Nodes are the statements of one method body plus synthetic entry and
//! exit nodes; edges carry the kind the dead-code detector needs to
//! prune constant branches. Adjacency lists preserve insertion order so
//! traversals are deterministic.

use crate::ir::{MethodId, Program, Stmt};

/// A node of a [`Cfg`].
///
/// Node 0 is the synthetic entry, node 1 the synthetic exit, and node
/// `2 + i` is statement `i` of the owning method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CfgNodeId(u32);

impl CfgNodeId {
    /// The synthetic entry node.
    pub const ENTRY: Self = Self(0);
    /// The synthetic exit node.
    pub const EXIT: Self = Self(1);

    /// Returns the node of statement `index`.
    #[must_use]
    pub const fn stmt(index: u32) -> Self {
        Self(index + 2)
    }

    /// Returns the statement index behind this node, or `None` for the
    /// synthetic entry/exit nodes.
    #[must_use]
    pub const fn as_stmt(self) -> Option<u32> {
        if self.0 >= 2 {
            Some(self.0 - 2)
        } else {
            None
        }
    }

    /// Returns the dense index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind label of a control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Fall-through or unconditional transfer.
    Normal,
    /// Edge taken when an `If` condition holds.
    IfTrue,
    /// Edge taken when an `If` condition fails.
    IfFalse,
    /// Edge of a switch case with the given value.
    SwitchCase(i32),
    /// The default edge of a switch.
    SwitchDefault,
}

/// A directed control-flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgEdge {
    /// Edge kind.
    pub kind: EdgeKind,
    /// Source node.
    pub source: CfgNodeId,
    /// Target node.
    pub target: CfgNodeId,
}

/// The control-flow graph of one method body.
#[derive(Debug)]
pub struct Cfg {
    method: MethodId,
    node_count: usize,
    out_edges: Vec<Vec<CfgEdge>>,
    in_edges: Vec<Vec<CfgEdge>>,
}

impl Cfg {
    /// Returns the owning method.
    #[must_use]
    pub fn method(&self) -> MethodId {
        self.method
    }

    /// Returns the number of nodes, synthetic nodes included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the synthetic entry node.
    #[must_use]
    pub fn entry(&self) -> CfgNodeId {
        CfgNodeId::ENTRY
    }

    /// Returns the synthetic exit node.
    #[must_use]
    pub fn exit(&self) -> CfgNodeId {
        CfgNodeId::EXIT
    }

    /// Iterates over all nodes in dense order.
    pub fn nodes(&self) -> impl Iterator<Item = CfgNodeId> {
        (0..self.node_count as u32).map(CfgNodeId)
    }

    /// Outgoing edges of a node, in insertion order.
    #[must_use]
    pub fn out_edges_of(&self, node: CfgNodeId) -> &[CfgEdge] {
        &self.out_edges[node.index()]
    }

    /// Incoming edges of a node, in insertion order.
    #[must_use]
    pub fn in_edges_of(&self, node: CfgNodeId) -> &[CfgEdge] {
        &self.in_edges[node.index()]
    }

    /// Successor nodes, in edge insertion order.
    pub fn succs_of(&self, node: CfgNodeId) -> impl Iterator<Item = CfgNodeId> + '_ {
        self.out_edges[node.index()].iter().map(|e| e.target)
    }

    /// Predecessor nodes, in edge insertion order.
    pub fn preds_of(&self, node: CfgNodeId) -> impl Iterator<Item = CfgNodeId> + '_ {
        self.in_edges[node.index()].iter().map(|e| e.source)
    }
}

/// Builds [`Cfg`]s from sealed method bodies.
pub struct CfgBuilder;

impl CfgBuilder {
    /// Builds the control-flow graph of `method`.
    ///
    /// # Panics
    ///
    /// Panics if the method has no body; CFGs exist for concrete
    /// methods only.
    #[must_use]
    pub fn build(program: &Program, method: MethodId) -> Cfg {
        let body = program.body(method).expect("CFG of abstract method");
        let node_count = body.stmts.len() + 2;
        let mut cfg = Cfg {
            method,
            node_count,
            out_edges: vec![Vec::new(); node_count],
            in_edges: vec![Vec::new(); node_count],
        };

        let first = if body.stmts.is_empty() {
            CfgNodeId::EXIT
        } else {
            CfgNodeId::stmt(0)
        };
        Self::add_edge(&mut cfg, EdgeKind::Normal, CfgNodeId::ENTRY, first);

        let len = body.stmts.len() as u32;
        let next_of = |index: u32| {
            if index + 1 < len {
                CfgNodeId::stmt(index + 1)
            } else {
                CfgNodeId::EXIT
            }
        };

        for (index, stmt) in body.stmts.iter().enumerate() {
            let index = index as u32;
            let source = CfgNodeId::stmt(index);
            match stmt {
                Stmt::If { target, .. } => {
                    Self::add_edge(&mut cfg, EdgeKind::IfTrue, source, CfgNodeId::stmt(*target));
                    Self::add_edge(&mut cfg, EdgeKind::IfFalse, source, next_of(index));
                }
                Stmt::Switch { cases, default, .. } => {
                    for (value, target) in cases {
                        Self::add_edge(
                            &mut cfg,
                            EdgeKind::SwitchCase(*value),
                            source,
                            CfgNodeId::stmt(*target),
                        );
                    }
                    Self::add_edge(
                        &mut cfg,
                        EdgeKind::SwitchDefault,
                        source,
                        CfgNodeId::stmt(*default),
                    );
                }
                Stmt::Goto { target } => {
                    Self::add_edge(&mut cfg, EdgeKind::Normal, source, CfgNodeId::stmt(*target));
                }
                Stmt::Return { .. } => {
                    Self::add_edge(&mut cfg, EdgeKind::Normal, source, CfgNodeId::EXIT);
                }
                _ => {
                    Self::add_edge(&mut cfg, EdgeKind::Normal, source, next_of(index));
                }
            }
        }

        cfg
    }

    fn add_edge(cfg: &mut Cfg, kind: EdgeKind, source: CfgNodeId, target: CfgNodeId) {
        let edge = CfgEdge {
            kind,
            source,
            target,
        };
        cfg.out_edges[source.index()].push(edge);
        cfg.in_edges[target.index()].push(edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        BinaryOp, Body, ClassFlags, Exp, MethodFlags, MethodId, Program, ProgramBuilder, Stmt,
        Type,
    };

    fn diamond() -> (Program, MethodId) {
        let mut pb = ProgramBuilder::new();
        let object = pb.add_class("Object", None, &[], ClassFlags::empty());
        let main = pb.add_method(object, "main", "main()", MethodFlags::STATIC, Type::Void);
        let x = pb.add_var(main, "x", Type::Int);
        let y = pb.add_var(main, "y", Type::Int);
        pb.set_body(
            main,
            Body {
                stmts: vec![
                    // 0: if (x == y) goto 3
                    Stmt::If {
                        op: BinaryOp::Eq,
                        lhs: x,
                        rhs: y,
                        target: 3,
                    },
                    // 1: y := 1
                    Stmt::Assign {
                        lhs: y,
                        rhs: Exp::IntLiteral(1),
                    },
                    // 2: goto 4
                    Stmt::Goto { target: 4 },
                    // 3: y := 2
                    Stmt::Assign {
                        lhs: y,
                        rhs: Exp::IntLiteral(2),
                    },
                    // 4: return
                    Stmt::Return { value: None },
                ],
                ..Body::default()
            },
        );
        pb.set_entry(main);
        (pb.finish().unwrap(), main)
    }

    #[test]
    fn test_branch_edges() {
        let (program, main) = diamond();
        let cfg = CfgBuilder::build(&program, main);

        let out = cfg.out_edges_of(CfgNodeId::stmt(0));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EdgeKind::IfTrue);
        assert_eq!(out[0].target, CfgNodeId::stmt(3));
        assert_eq!(out[1].kind, EdgeKind::IfFalse);
        assert_eq!(out[1].target, CfgNodeId::stmt(1));
    }

    #[test]
    fn test_join_preds() {
        let (program, main) = diamond();
        let cfg = CfgBuilder::build(&program, main);

        let preds: Vec<_> = cfg.preds_of(CfgNodeId::stmt(4)).collect();
        assert_eq!(preds, vec![CfgNodeId::stmt(2), CfgNodeId::stmt(3)]);
    }

    #[test]
    fn test_return_goes_to_exit() {
        let (program, main) = diamond();
        let cfg = CfgBuilder::build(&program, main);
        let succs: Vec<_> = cfg.succs_of(CfgNodeId::stmt(4)).collect();
        assert_eq!(succs, vec![CfgNodeId::EXIT]);
    }
}
