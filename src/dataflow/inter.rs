//! Interprocedural dataflow solving and alias-aware constant
//! propagation.
//!
//! The solver iterates over the ICFG: node facts meet in over edge
//! transfers keyed by edge kind, call nodes pass their fact through
//! untouched (values travel along the Call/Return edges instead), and
//! heap accesses consult the pointer analysis. The analysis cannot hold
//! a reference back to its solver, so the solver hands each node
//! transfer a read-only view of all IN facts plus a re-enqueue buffer.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::dataflow::constprop::ConstantPropagation;
use crate::dataflow::lattice::{CpFact, Value};
use crate::graph::{Icfg, IcfgEdge, IcfgEdgeKind, IcfgNodeId};
use crate::ir::{FieldId, Program, Stmt, VarId};
use crate::pta::PointerAnalysisResult;

/// Read-only view of every node's IN fact during a transfer.
pub struct InterFacts<'s, F> {
    ins: &'s [F],
}

impl<F> InterFacts<'_, F> {
    /// The IN fact of a node.
    #[must_use]
    pub fn in_fact(&self, node: IcfgNodeId) -> &F {
        &self.ins[node.index()]
    }
}

/// An interprocedural dataflow analysis over the ICFG.
///
/// Extends the intraprocedural contract with a call/non-call split of
/// the node transfer and one edge transfer per ICFG edge kind.
pub trait InterDataflowAnalysis {
    /// The fact attached to each program point.
    type Fact: Clone + PartialEq;

    /// Boundary fact for an entry node of an entry method.
    fn new_boundary_fact(&self, node: IcfgNodeId) -> Self::Fact;

    /// Initial fact of every other node.
    fn new_initial_fact(&self) -> Self::Fact;

    /// Merges `fact` into `target` (monotone meet).
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    /// Transfer of a call node. Values of the call itself travel along
    /// the edges, so this is typically the identity.
    fn transfer_call_node(
        &self,
        node: IcfgNodeId,
        input: &Self::Fact,
        output: &mut Self::Fact,
    ) -> bool;

    /// Transfer of every other node.
    ///
    /// `facts` exposes all nodes' current IN facts; `requeue` collects
    /// nodes this transfer wants re-solved (heap stores wake their
    /// aliased loads through it).
    fn transfer_non_call_node(
        &self,
        node: IcfgNodeId,
        facts: &InterFacts<'_, Self::Fact>,
        output: &mut Self::Fact,
        requeue: &mut Vec<IcfgNodeId>,
    ) -> bool;

    /// Transfer along a `Normal` edge.
    fn transfer_normal_edge(&self, edge: &IcfgEdge, out: &Self::Fact) -> Self::Fact;

    /// Transfer along a `CallToReturn` edge.
    fn transfer_call_to_return_edge(&self, edge: &IcfgEdge, out: &Self::Fact) -> Self::Fact;

    /// Transfer along a `Call` edge into the callee.
    fn transfer_call_edge(&self, edge: &IcfgEdge, callsite_out: &Self::Fact) -> Self::Fact;

    /// Transfer along a `Return` edge back to the caller.
    fn transfer_return_edge(&self, edge: &IcfgEdge, callee_out: &Self::Fact) -> Self::Fact;
}

/// Per-node IN/OUT facts of an interprocedural run.
#[derive(Debug, Clone)]
pub struct InterDataflowResult<F> {
    ins: Vec<F>,
    outs: Vec<F>,
}

impl<F> InterDataflowResult<F> {
    /// The IN fact of a node.
    #[must_use]
    pub fn in_fact(&self, node: IcfgNodeId) -> &F {
        &self.ins[node.index()]
    }

    /// The OUT fact of a node.
    #[must_use]
    pub fn out_fact(&self, node: IcfgNodeId) -> &F {
        &self.outs[node.index()]
    }
}

/// Worklist solver over the ICFG.
///
/// Seeds every node with the initial fact, gives entry nodes of entry
/// methods their boundary OUT fact (those nodes are left alone by the
/// loop so the boundary survives), and iterates FIFO until no fact
/// changes.
pub struct InterSolver<'a, A: InterDataflowAnalysis> {
    analysis: &'a A,
    icfg: &'a Icfg,
}

impl<'a, A: InterDataflowAnalysis> InterSolver<'a, A> {
    /// Creates a solver for the analysis over `icfg`.
    #[must_use]
    pub fn new(analysis: &'a A, icfg: &'a Icfg) -> Self {
        Self { analysis, icfg }
    }

    /// Runs to the fixed point and returns the fact tables.
    #[must_use]
    pub fn solve(&self) -> InterDataflowResult<A::Fact> {
        let node_count = self.icfg.node_count();
        let mut ins: Vec<A::Fact> = (0..node_count)
            .map(|_| self.analysis.new_initial_fact())
            .collect();
        let mut outs: Vec<A::Fact> = (0..node_count)
            .map(|_| self.analysis.new_initial_fact())
            .collect();

        let boundary_node = self
            .icfg
            .entry_method()
            .and_then(|method| self.icfg.entry_of(method));
        if let Some(node) = boundary_node {
            outs[node.index()] = self.analysis.new_boundary_fact(node);
        }

        let mut worklist: VecDeque<IcfgNodeId> = VecDeque::new();
        let mut queued = vec![false; node_count];
        for node in self.icfg.nodes() {
            if Some(node) == boundary_node {
                continue;
            }
            worklist.push_back(node);
            queued[node.index()] = true;
        }

        let mut requeue: Vec<IcfgNodeId> = Vec::new();
        while let Some(node) = worklist.pop_front() {
            queued[node.index()] = false;

            let mut input = self.analysis.new_initial_fact();
            for edge in self.icfg.in_edges_of(node) {
                let source_out = &outs[edge.source.index()];
                let fact = match edge.kind {
                    IcfgEdgeKind::Normal => self.analysis.transfer_normal_edge(edge, source_out),
                    IcfgEdgeKind::CallToReturn => {
                        self.analysis.transfer_call_to_return_edge(edge, source_out)
                    }
                    IcfgEdgeKind::Call { .. } => {
                        self.analysis.transfer_call_edge(edge, source_out)
                    }
                    IcfgEdgeKind::Return { .. } => {
                        self.analysis.transfer_return_edge(edge, source_out)
                    }
                };
                self.analysis.meet_into(&fact, &mut input);
            }
            ins[node.index()] = input;

            let mut output =
                std::mem::replace(&mut outs[node.index()], self.analysis.new_initial_fact());
            let changed = if self.icfg.is_call(node) {
                self.analysis
                    .transfer_call_node(node, &ins[node.index()], &mut output)
            } else {
                let facts = InterFacts { ins: &ins };
                self.analysis
                    .transfer_non_call_node(node, &facts, &mut output, &mut requeue)
            };
            outs[node.index()] = output;

            if changed {
                for succ in self.icfg.succs_of(node) {
                    if !queued[succ.index()] && Some(succ) != boundary_node {
                        worklist.push_back(succ);
                        queued[succ.index()] = true;
                    }
                }
            }
            for woken in requeue.drain(..) {
                if !queued[woken.index()] && Some(woken) != boundary_node {
                    worklist.push_back(woken);
                    queued[woken.index()] = true;
                }
            }
        }

        InterDataflowResult { ins, outs }
    }
}

/// Interprocedural constant propagation refined by aliasing.
///
/// Runs after pointer analysis. Loads read the values stored through
/// every alias of their base; stores wake the loads they may feed so
/// the fixed point converges on the meet over all aliased stores.
pub struct InterConstantPropagation<'p> {
    program: &'p Program,
    icfg: &'p Icfg,
    pta: &'p PointerAnalysisResult,
    static_stores: IndexMap<FieldId, Vec<IcfgNodeId>>,
    static_loads: IndexMap<FieldId, Vec<IcfgNodeId>>,
}

impl<'p> InterConstantPropagation<'p> {
    /// Creates the analysis; scans the ICFG once for static field
    /// accesses.
    #[must_use]
    pub fn new(program: &'p Program, icfg: &'p Icfg, pta: &'p PointerAnalysisResult) -> Self {
        let mut static_stores: IndexMap<FieldId, Vec<IcfgNodeId>> = IndexMap::new();
        let mut static_loads: IndexMap<FieldId, Vec<IcfgNodeId>> = IndexMap::new();
        for node in icfg.nodes() {
            match icfg.stmt_of(program, node) {
                Some(Stmt::StoreField {
                    base: None, field, ..
                }) => static_stores.entry(*field).or_default().push(node),
                Some(Stmt::LoadField {
                    base: None, field, ..
                }) => static_loads.entry(*field).or_default().push(node),
                _ => {}
            }
        }
        Self {
            program,
            icfg,
            pta,
            static_stores,
            static_loads,
        }
    }

    /// Variables aliased with `var` (itself included when it points
    /// anywhere), in the deterministic order of the pointer analysis.
    fn alias_vars(&self, var: VarId) -> Vec<VarId> {
        self.pta
            .vars()
            .filter(|&other| self.pta.is_alias(var, other))
            .collect()
    }

    /// Index compatibility of an array load and store.
    ///
    /// `Undef` on either side means that access is unreachable and
    /// cannot feed the other; `Nac` may collide with anything; two
    /// constants collide iff equal.
    fn indexes_compatible(load_index: Value, store_index: Value) -> bool {
        match (load_index, store_index) {
            (Value::Undef, _) | (_, Value::Undef) => false,
            (Value::Nac, _) | (_, Value::Nac) => true,
            (Value::Const(a), Value::Const(b)) => a == b,
        }
    }

    fn finish_with(
        &self,
        input: &CpFact,
        lhs: VarId,
        value: Value,
        output: &mut CpFact,
    ) -> bool {
        let mut new_out = input.clone();
        new_out.update(lhs, value);
        let changed = new_out != *output;
        *output = new_out;
        changed
    }
}

impl InterDataflowAnalysis for InterConstantPropagation<'_> {
    type Fact = CpFact;

    fn new_boundary_fact(&self, node: IcfgNodeId) -> CpFact {
        let method = self.icfg.containing_method(node);
        let mut fact = CpFact::new();
        if let Some(body) = self.program.body(method) {
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

    fn transfer_call_node(&self, _node: IcfgNodeId, input: &CpFact, output: &mut CpFact) -> bool {
        let changed = input != output;
        *output = input.clone();
        changed
    }

    fn transfer_non_call_node(
        &self,
        node: IcfgNodeId,
        facts: &InterFacts<'_, CpFact>,
        output: &mut CpFact,
        requeue: &mut Vec<IcfgNodeId>,
    ) -> bool {
        let input = facts.in_fact(node);
        let stmt = self.icfg.stmt_of(self.program, node);
        match stmt {
            Some(Stmt::LoadField { lhs, base, field }) if self.program.can_hold_int(*lhs) => {
                let mut value = Value::Undef;
                match base {
                    Some(base) => {
                        for alias in self.alias_vars(*base) {
                            for &store_site in &self.program.var_usage(alias).store_fields {
                                let Stmt::StoreField {
                                    field: store_field,
                                    rhs,
                                    ..
                                } = self.program.stmt(store_site)
                                else {
                                    continue;
                                };
                                if store_field != field {
                                    continue;
                                }
                                let Some(store_node) = self.icfg.node_of_site(store_site) else {
                                    continue;
                                };
                                value = value.meet(facts.in_fact(store_node).get(*rhs));
                            }
                        }
                    }
                    None => {
                        for &store_node in
                            self.static_stores.get(field).into_iter().flatten()
                        {
                            let Some(Stmt::StoreField { rhs, .. }) =
                                self.icfg.stmt_of(self.program, store_node)
                            else {
                                continue;
                            };
                            value = value.meet(facts.in_fact(store_node).get(*rhs));
                        }
                    }
                }
                self.finish_with(input, *lhs, value, output)
            }
            Some(Stmt::LoadArray { lhs, base, index }) if self.program.can_hold_int(*lhs) => {
                let load_index = input.get(*index);
                let mut value = Value::Undef;
                for alias in self.alias_vars(*base) {
                    for &store_site in &self.program.var_usage(alias).store_arrays {
                        let Stmt::StoreArray {
                            index: store_index,
                            rhs,
                            ..
                        } = self.program.stmt(store_site)
                        else {
                            continue;
                        };
                        let Some(store_node) = self.icfg.node_of_site(store_site) else {
                            continue;
                        };
                        let store_fact = facts.in_fact(store_node);
                        if Self::indexes_compatible(load_index, store_fact.get(*store_index)) {
                            value = value.meet(store_fact.get(*rhs));
                        }
                    }
                }
                self.finish_with(input, *lhs, value, output)
            }
            Some(Stmt::StoreField { base, field, rhs }) => {
                if self.program.can_hold_int(*rhs) {
                    match base {
                        Some(base) => {
                            for alias in self.alias_vars(*base) {
                                for &load_site in &self.program.var_usage(alias).load_fields {
                                    let Stmt::LoadField {
                                        field: load_field, ..
                                    } = self.program.stmt(load_site)
                                    else {
                                        continue;
                                    };
                                    if load_field != field {
                                        continue;
                                    }
                                    if let Some(load_node) = self.icfg.node_of_site(load_site) {
                                        requeue.push(load_node);
                                    }
                                }
                            }
                        }
                        None => {
                            requeue
                                .extend(self.static_loads.get(field).into_iter().flatten());
                        }
                    }
                }
                ConstantPropagation::transfer_stmt(self.program, stmt, input, output)
            }
            Some(Stmt::StoreArray { base, index, rhs }) => {
                if self.program.can_hold_int(*rhs) {
                    let store_index = input.get(*index);
                    for alias in self.alias_vars(*base) {
                        for &load_site in &self.program.var_usage(alias).load_arrays {
                            let Stmt::LoadArray {
                                index: load_index, ..
                            } = self.program.stmt(load_site)
                            else {
                                continue;
                            };
                            let Some(load_node) = self.icfg.node_of_site(load_site) else {
                                continue;
                            };
                            let load_fact = facts.in_fact(load_node);
                            if Self::indexes_compatible(load_fact.get(*load_index), store_index) {
                                requeue.push(load_node);
                            }
                        }
                    }
                }
                ConstantPropagation::transfer_stmt(self.program, stmt, input, output)
            }
            _ => ConstantPropagation::transfer_stmt(self.program, stmt, input, output),
        }
    }

    fn transfer_normal_edge(&self, _edge: &IcfgEdge, out: &CpFact) -> CpFact {
        out.clone()
    }

    fn transfer_call_to_return_edge(&self, edge: &IcfgEdge, out: &CpFact) -> CpFact {
        let mut fact = out.clone();
        if let Some(Stmt::Invoke(invoke)) = self.icfg.stmt_of(self.program, edge.source) {
            if let Some(result) = invoke.result {
                // killed here; the Return edge carries the value in
                fact.update(result, Value::Undef);
            }
        }
        fact
    }

    fn transfer_call_edge(&self, edge: &IcfgEdge, callsite_out: &CpFact) -> CpFact {
        let mut fact = CpFact::new();
        let IcfgEdgeKind::Call { callee } = edge.kind else {
            return fact;
        };
        let Some(Stmt::Invoke(invoke)) = self.icfg.stmt_of(self.program, edge.source) else {
            return fact;
        };
        if let Some(body) = self.program.body(callee) {
            for (&param, &arg) in body.params.iter().zip(invoke.args.iter()) {
                fact.update(param, callsite_out.get(arg));
            }
        }
        fact
    }

    fn transfer_return_edge(&self, edge: &IcfgEdge, callee_out: &CpFact) -> CpFact {
        let mut fact = CpFact::new();
        let IcfgEdgeKind::Return { call_site, callee } = edge.kind else {
            return fact;
        };
        let Some(Stmt::Invoke(invoke)) = self.icfg.stmt_of(self.program, call_site) else {
            return fact;
        };
        let Some(result) = invoke.result else {
            return fact;
        };
        let mut value = Value::Undef;
        if let Some(body) = self.program.body(callee) {
            for &ret in &body.return_vars {
                value = value.meet(callee_out.get(ret));
            }
        }
        fact.update(result, value);
        fact
    }
}

/// Convenience entry: runs alias-aware interprocedural constant
/// propagation over an ICFG.
#[must_use]
pub fn solve_inter_constants(
    program: &Program,
    icfg: &Icfg,
    pta: &PointerAnalysisResult,
) -> InterDataflowResult<CpFact> {
    let analysis = InterConstantPropagation::new(program, icfg, pta);
    InterSolver::new(&analysis, icfg).solve()
}
