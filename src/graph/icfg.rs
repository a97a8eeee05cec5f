//! The interprocedural control-flow graph.
//!
//! Nodes are the CFG nodes of every reachable concrete method, indexed
//! globally and densely. Edges come in four kinds: intraprocedural
//! `Normal` edges, `Call` edges into callee entries, `Return` edges out
//! of callee exits, and `CallToReturn` edges that carry the caller's
//! local state across a call site.

use rustc_hash::FxHashMap;

use crate::graph::callgraph::CallGraph;
use crate::graph::cfg::{Cfg, CfgBuilder, CfgNodeId};
use crate::ir::{MethodId, Program, Stmt, StmtSite};

/// Global identity of an ICFG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IcfgNodeId(u32);

impl IcfgNodeId {
    /// Returns the dense index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of an interprocedural edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcfgEdgeKind {
    /// Intraprocedural edge between two nodes of one method.
    Normal,
    /// Call site to callee entry.
    Call {
        /// The callee method.
        callee: MethodId,
    },
    /// Callee exit back to the caller's return site.
    Return {
        /// The originating call site.
        call_site: IcfgNodeId,
        /// The returning callee.
        callee: MethodId,
    },
    /// Call site to its return site within the caller.
    CallToReturn,
}

/// A directed interprocedural edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcfgEdge {
    /// Edge kind.
    pub kind: IcfgEdgeKind,
    /// Source node.
    pub source: IcfgNodeId,
    /// Target node.
    pub target: IcfgNodeId,
}

/// The interprocedural CFG over all reachable concrete methods.
#[derive(Debug)]
pub struct Icfg {
    methods: Vec<MethodId>,
    offsets: FxHashMap<MethodId, u32>,
    nodes: Vec<(MethodId, CfgNodeId)>,
    in_edges: Vec<Vec<IcfgEdge>>,
    out_edges: Vec<Vec<IcfgEdge>>,
    is_call: Vec<bool>,
    entry_method: Option<MethodId>,
}

impl Icfg {
    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterates all nodes in dense order.
    pub fn nodes(&self) -> impl Iterator<Item = IcfgNodeId> {
        (0..self.nodes.len() as u32).map(IcfgNodeId)
    }

    /// The methods included, in discovery order.
    #[must_use]
    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    /// The program entry method, when it is part of the graph.
    #[must_use]
    pub fn entry_method(&self) -> Option<MethodId> {
        self.entry_method
    }

    /// Maps a method-local CFG node to its global id.
    #[must_use]
    pub fn node_of(&self, method: MethodId, node: CfgNodeId) -> Option<IcfgNodeId> {
        self.offsets
            .get(&method)
            .map(|offset| IcfgNodeId(offset + node.index() as u32))
    }

    /// Global id of a statement site.
    #[must_use]
    pub fn node_of_site(&self, site: StmtSite) -> Option<IcfgNodeId> {
        self.node_of(site.method, CfgNodeId::stmt(site.index))
    }

    /// Entry node of a method.
    #[must_use]
    pub fn entry_of(&self, method: MethodId) -> Option<IcfgNodeId> {
        self.node_of(method, CfgNodeId::ENTRY)
    }

    /// Exit node of a method.
    #[must_use]
    pub fn exit_of(&self, method: MethodId) -> Option<IcfgNodeId> {
        self.node_of(method, CfgNodeId::EXIT)
    }

    /// The method containing a node.
    #[must_use]
    pub fn containing_method(&self, node: IcfgNodeId) -> MethodId {
        self.nodes[node.index()].0
    }

    /// The statement site behind a node, `None` for synthetic
    /// entry/exit nodes.
    #[must_use]
    pub fn site_of(&self, node: IcfgNodeId) -> Option<StmtSite> {
        let (method, cfg_node) = self.nodes[node.index()];
        cfg_node.as_stmt().map(|index| StmtSite::new(method, index))
    }

    /// The statement behind a node, `None` for synthetic nodes.
    #[must_use]
    pub fn stmt_of<'p>(&self, program: &'p Program, node: IcfgNodeId) -> Option<&'p Stmt> {
        self.site_of(node).map(|site| program.stmt(site))
    }

    /// Returns `true` if the node is an invocation.
    #[must_use]
    pub fn is_call(&self, node: IcfgNodeId) -> bool {
        self.is_call[node.index()]
    }

    /// Incoming edges, in insertion order.
    #[must_use]
    pub fn in_edges_of(&self, node: IcfgNodeId) -> &[IcfgEdge] {
        &self.in_edges[node.index()]
    }

    /// Outgoing edges, in insertion order.
    #[must_use]
    pub fn out_edges_of(&self, node: IcfgNodeId) -> &[IcfgEdge] {
        &self.out_edges[node.index()]
    }

    /// Successor nodes, in edge insertion order.
    pub fn succs_of(&self, node: IcfgNodeId) -> impl Iterator<Item = IcfgNodeId> + '_ {
        self.out_edges[node.index()].iter().map(|e| e.target)
    }

    fn add_edge(&mut self, kind: IcfgEdgeKind, source: IcfgNodeId, target: IcfgNodeId) {
        let edge = IcfgEdge {
            kind,
            source,
            target,
        };
        self.out_edges[source.index()].push(edge);
        self.in_edges[target.index()].push(edge);
    }
}

/// Builds an [`Icfg`] from a program and a call graph.
pub struct IcfgBuilder;

impl IcfgBuilder {
    /// Assembles the interprocedural CFG for every concrete method the
    /// call graph reaches.
    ///
    /// Out-edges of call sites become `CallToReturn` edges; resolved
    /// callees additionally contribute `Call` and `Return` edges. Call
    /// sites whose resolution found no target keep only the
    /// `CallToReturn` edge.
    #[must_use]
    pub fn build(program: &Program, call_graph: &CallGraph) -> Icfg {
        let methods: Vec<MethodId> = call_graph
            .reachable_methods()
            .filter(|&m| program.body(m).is_some())
            .collect();

        let mut offsets = FxHashMap::default();
        let mut nodes = Vec::new();
        let mut cfgs: Vec<Cfg> = Vec::with_capacity(methods.len());
        for &method in &methods {
            let cfg = CfgBuilder::build(program, method);
            offsets.insert(method, nodes.len() as u32);
            for node in cfg.nodes() {
                nodes.push((method, node));
            }
            cfgs.push(cfg);
        }

        let node_count = nodes.len();
        let mut icfg = Icfg {
            methods,
            offsets,
            nodes,
            in_edges: vec![Vec::new(); node_count],
            out_edges: vec![Vec::new(); node_count],
            is_call: vec![false; node_count],
            entry_method: program.entry_method(),
        };

        for cfg in &cfgs {
            let method = cfg.method();
            let body = program.body(method).expect("concrete method");
            for node in cfg.nodes() {
                let global = icfg.node_of(method, node).expect("own node");
                let is_call_site = node
                    .as_stmt()
                    .is_some_and(|index| body.stmts[index as usize].as_invoke().is_some());
                icfg.is_call[global.index()] = is_call_site;

                for edge in cfg.out_edges_of(node) {
                    let target = icfg.node_of(method, edge.target).expect("own node");
                    let kind = if is_call_site {
                        IcfgEdgeKind::CallToReturn
                    } else {
                        IcfgEdgeKind::Normal
                    };
                    icfg.add_edge(kind, global, target);
                }

                if is_call_site {
                    let site = StmtSite::new(method, node.as_stmt().expect("call site"));
                    let return_sites: Vec<IcfgNodeId> = cfg
                        .succs_of(node)
                        .map(|succ| icfg.node_of(method, succ).expect("own node"))
                        .collect();
                    for &callee in call_graph.callees_of(site) {
                        let (Some(callee_entry), Some(callee_exit)) =
                            (icfg.entry_of(callee), icfg.exit_of(callee))
                        else {
                            continue;
                        };
                        icfg.add_edge(IcfgEdgeKind::Call { callee }, global, callee_entry);
                        for &return_site in &return_sites {
                            icfg.add_edge(
                                IcfgEdgeKind::Return {
                                    call_site: global,
                                    callee,
                                },
                                callee_exit,
                                return_site,
                            );
                        }
                    }
                }
            }
        }

        icfg
    }
}
