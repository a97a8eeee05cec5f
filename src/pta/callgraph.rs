//! The context-sensitive call graph built on the fly by the solver.

use indexmap::{IndexMap, IndexSet};

use crate::ir::CallKind;
use crate::pta::element::{CsCallSiteId, CsMethodId};

/// A context-sensitive call edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsCallEdge {
    /// Lexical kind of the call site.
    pub kind: CallKind,
    /// The (context, call site) pair.
    pub site: CsCallSiteId,
    /// The (context, method) pair of the callee.
    pub callee: CsMethodId,
}

/// Reachable (context, method) pairs plus call edges, in discovery
/// order.
#[derive(Debug, Default)]
pub struct CsCallGraph {
    reachable: IndexSet<CsMethodId>,
    edges: IndexSet<CsCallEdge>,
    by_site: IndexMap<CsCallSiteId, Vec<CsCallEdge>>,
}

impl CsCallGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a method reachable. Returns `true` if it was new.
    pub fn add_reachable(&mut self, method: CsMethodId) -> bool {
        self.reachable.insert(method)
    }

    /// Returns `true` if the method is reachable.
    #[must_use]
    pub fn contains(&self, method: CsMethodId) -> bool {
        self.reachable.contains(&method)
    }

    /// Adds a call edge. Returns `true` if it was new.
    pub fn add_edge(&mut self, edge: CsCallEdge) -> bool {
        if self.edges.insert(edge) {
            self.by_site.entry(edge.site).or_default().push(edge);
            true
        } else {
            false
        }
    }

    /// All edges, in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = &CsCallEdge> {
        self.edges.iter()
    }

    /// Edges leaving one (context, call site), in discovery order.
    #[must_use]
    pub fn edges_of_site(&self, site: CsCallSiteId) -> &[CsCallEdge] {
        self.by_site.get(&site).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reachable methods, in discovery order.
    pub fn reachable_methods(&self) -> impl Iterator<Item = CsMethodId> + '_ {
        self.reachable.iter().copied()
    }

    /// Number of reachable methods.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }
}
