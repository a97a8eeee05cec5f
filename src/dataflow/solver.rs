//! The generic worklist solver.
//!
//! Iterates a [`DataflowAnalysis`] to its fixed point over one
//! method's CFG. The worklist is FIFO with membership tracking so a
//! node appears at most once; enqueue order is discovery order, which
//! keeps runs deterministic. Termination follows from transfer
//! monotonicity over a finite lattice.

use std::collections::VecDeque;

use crate::dataflow::framework::{DataflowAnalysis, DataflowResult};
use crate::graph::{Cfg, CfgNodeId};

/// Worklist-based fixed-point solver.
///
/// # Algorithm (forward; backward is symmetric)
///
/// 1. Every node's IN/OUT starts at the initial fact; the entry node's
///    OUT is replaced by the boundary fact.
/// 2. All nodes except the entry go on the worklist.
/// 3. Pop a node, reset its IN to the initial fact, meet in every
///    predecessor's OUT, and run the transfer. If the OUT changed,
///    enqueue all successors not already queued.
pub struct WorklistSolver<'a, A: DataflowAnalysis> {
    analysis: &'a A,
}

impl<'a, A: DataflowAnalysis> WorklistSolver<'a, A> {
    /// Creates a solver for the given analysis.
    #[must_use]
    pub fn new(analysis: &'a A) -> Self {
        Self { analysis }
    }

    /// Runs the analysis to its fixed point and returns the fact
    /// tables.
    #[must_use]
    pub fn solve(&self, cfg: &Cfg) -> DataflowResult<A::Fact> {
        if self.analysis.is_forward() {
            self.solve_forward(cfg)
        } else {
            self.solve_backward(cfg)
        }
    }

    fn solve_forward(&self, cfg: &Cfg) -> DataflowResult<A::Fact> {
        let node_count = cfg.node_count();
        let mut ins: Vec<A::Fact> = (0..node_count)
            .map(|_| self.analysis.new_initial_fact())
            .collect();
        let mut outs: Vec<A::Fact> = (0..node_count)
            .map(|_| self.analysis.new_initial_fact())
            .collect();
        outs[cfg.entry().index()] = self.analysis.new_boundary_fact(cfg);

        let mut worklist: VecDeque<CfgNodeId> = VecDeque::new();
        let mut queued = vec![false; node_count];
        for node in cfg.nodes() {
            if node == cfg.entry() {
                continue;
            }
            worklist.push_back(node);
            queued[node.index()] = true;
        }

        while let Some(node) = worklist.pop_front() {
            queued[node.index()] = false;

            let mut input = self.analysis.new_initial_fact();
            for pred in cfg.preds_of(node) {
                self.analysis.meet_into(&outs[pred.index()], &mut input);
            }

            let changed = {
                let output = &mut outs[node.index()];
                self.analysis.transfer_node(node, &input, output)
            };
            debug_assert!(
                {
                    let mut replay = outs[node.index()].clone();
                    !self.analysis.transfer_node(node, &input, &mut replay)
                },
                "transfer is not idempotent at {node:?}"
            );
            ins[node.index()] = input;

            if changed {
                for succ in cfg.succs_of(node) {
                    if !queued[succ.index()] {
                        worklist.push_back(succ);
                        queued[succ.index()] = true;
                    }
                }
            }
        }

        DataflowResult::new(ins, outs)
    }

    fn solve_backward(&self, cfg: &Cfg) -> DataflowResult<A::Fact> {
        let node_count = cfg.node_count();
        let mut ins: Vec<A::Fact> = (0..node_count)
            .map(|_| self.analysis.new_initial_fact())
            .collect();
        let mut outs: Vec<A::Fact> = (0..node_count)
            .map(|_| self.analysis.new_initial_fact())
            .collect();
        ins[cfg.exit().index()] = self.analysis.new_boundary_fact(cfg);

        let mut worklist: VecDeque<CfgNodeId> = VecDeque::new();
        let mut queued = vec![false; node_count];
        for node in cfg.nodes() {
            if node == cfg.exit() {
                continue;
            }
            worklist.push_back(node);
            queued[node.index()] = true;
        }

        while let Some(node) = worklist.pop_front() {
            queued[node.index()] = false;

            let mut output = self.analysis.new_initial_fact();
            for succ in cfg.succs_of(node) {
                self.analysis.meet_into(&ins[succ.index()], &mut output);
            }

            let changed = {
                let input = &mut ins[node.index()];
                self.analysis.transfer_node(node, &output, input)
            };
            outs[node.index()] = output;

            if changed {
                for pred in cfg.preds_of(node) {
                    if !queued[pred.index()] {
                        worklist.push_back(pred);
                        queued[pred.index()] = true;
                    }
                }
            }
        }

        DataflowResult::new(ins, outs)
    }
}
