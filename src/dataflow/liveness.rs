//! Live-variable analysis.
//!
//! Backward set-lattice analysis: a variable is live at a point if
//! some path from that point reaches a use before any redefinition.
//! `OUT(s) = ⋃ IN(succ)` and `IN(s) = use(s) ∪ (OUT(s) \ def(s))`.
//! The dead-code detector consumes the OUT facts as its liveness
//! oracle.

use crate::dataflow::framework::DataflowAnalysis;
use crate::dataflow::lattice::SetFact;
use crate::graph::{Cfg, CfgNodeId};
use crate::ir::{MethodId, Program, VarId};

/// Live-variable analysis over one method.
pub struct LiveVariableAnalysis<'p> {
    program: &'p Program,
    method: MethodId,
}

impl<'p> LiveVariableAnalysis<'p> {
    /// Creates the analysis for `method`.
    #[must_use]
    pub fn new(program: &'p Program, method: MethodId) -> Self {
        Self { program, method }
    }
}

impl DataflowAnalysis for LiveVariableAnalysis<'_> {
    type Fact = SetFact<VarId>;

    fn is_forward(&self) -> bool {
        false
    }

    fn new_boundary_fact(&self, _cfg: &Cfg) -> SetFact<VarId> {
        SetFact::new()
    }

    fn new_initial_fact(&self) -> SetFact<VarId> {
        SetFact::new()
    }

    fn meet_into(&self, fact: &SetFact<VarId>, target: &mut SetFact<VarId>) {
        target.union_with(fact);
    }

    fn transfer_node(
        &self,
        node: CfgNodeId,
        input: &SetFact<VarId>,
        output: &mut SetFact<VarId>,
    ) -> bool {
        // backward: input is the OUT fact, output the IN fact
        let mut new_in = input.clone();
        if let Some(index) = node.as_stmt() {
            let body = self.program.body(self.method).expect("concrete method");
            let stmt = &body.stmts[index as usize];
            if let Some(def) = stmt.def() {
                new_in.remove(&def);
            }
            for var in stmt.uses() {
                new_in.insert(var);
            }
        }
        let changed = new_in != *output;
        *output = new_in;
        changed
    }
}
