//! The pointer flow graph.
//!
//! An edge `s → t` means the points-to set of `s` flows into `t`.
//! Edge insertion is idempotent and successor lists keep insertion
//! order so propagation is deterministic.

use rustc_hash::FxHashSet;

use crate::pta::element::PointerId;

/// Directed graph over interned pointers.
#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    edges: FxHashSet<(PointerId, PointerId)>,
    succs: Vec<Vec<PointerId>>,
}

impl PointerFlowGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge. Returns `true` if it was new.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        if !self.edges.insert((source, target)) {
            return false;
        }
        if source.index() >= self.succs.len() {
            self.succs.resize_with(source.index() + 1, Vec::new);
        }
        self.succs[source.index()].push(target);
        true
    }

    /// Successors of a pointer, in insertion order.
    #[must_use]
    pub fn succs_of(&self, pointer: PointerId) -> &[PointerId] {
        self.succs
            .get(pointer.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
