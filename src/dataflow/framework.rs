//! The dataflow-analysis contract and result tables.
//!
//! A specific analysis (constant propagation, liveness) implements
//! [`DataflowAnalysis`]; the solver handles iteration to a fixed point.
//! The transfer function must be monotone with respect to the fact
//! lattice, and `meet_into` must be a monotone merge; termination of
//! the solver depends on both.

use crate::graph::{Cfg, CfgNodeId};

/// A dataflow analysis over a single method's CFG.
///
/// # Direction
///
/// `is_forward` decides iteration order and which neighbor facts feed
/// a node: predecessors' OUT facts for forward analyses, successors'
/// IN facts for backward ones.
///
/// # Transfer
///
/// `transfer_node` receives the fact flowing into the node (IN for
/// forward, OUT for backward) and must rewrite the fact flowing out of
/// it, returning `true` iff that fact changed. The solver re-enqueues
/// dependent nodes only on change, so a transfer that lies about
/// change breaks the fixed point.
pub trait DataflowAnalysis {
    /// The fact (lattice element) attached to each program point.
    type Fact: Clone + PartialEq;

    /// Returns `true` for forward analyses.
    fn is_forward(&self) -> bool;

    /// The fact at the analysis boundary: function entry for forward
    /// analyses, exit for backward ones.
    fn new_boundary_fact(&self, cfg: &Cfg) -> Self::Fact;

    /// The initial fact of every interior node.
    fn new_initial_fact(&self) -> Self::Fact;

    /// Merges `fact` into `target` (monotone meet).
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Applies the node's transfer function.
    ///
    /// Returns `true` iff `output` was modified.
    fn transfer_node(&self, node: CfgNodeId, input: &Self::Fact, output: &mut Self::Fact)
        -> bool;
}

/// Per-node IN/OUT facts of one analysis run.
///
/// Owned exclusively by the solver while it runs, then handed to
/// clients read-only.
#[derive(Debug, Clone)]
pub struct DataflowResult<F> {
    ins: Vec<F>,
    outs: Vec<F>,
}

impl<F> DataflowResult<F> {
    pub(crate) fn new(ins: Vec<F>, outs: Vec<F>) -> Self {
        Self { ins, outs }
    }

    /// The IN fact of a node.
    #[must_use]
    pub fn in_fact(&self, node: CfgNodeId) -> &F {
        &self.ins[node.index()]
    }

    /// The OUT fact of a node.
    #[must_use]
    pub fn out_fact(&self, node: CfgNodeId) -> &F {
        &self.outs[node.index()]
    }

    /// Number of nodes covered.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ins.len()
    }
}
