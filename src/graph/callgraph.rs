//! Call graphs and class-hierarchy-analysis construction.
//!
//! The [`CallGraph`] records reachable methods and call edges tagged
//! with their lexical kind. [`ChaBuilder`] produces one by resolving
//! every call site through the class hierarchy: cheap, deterministic,
//! and an over-approximation of any actual execution, which is what the
//! dead-code and interprocedural clients need. Pointer-aware clients
//! use the call graph built on the fly by the pointer analysis instead.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ir::{CallKind, ClassId, Invoke, MethodId, Program, StmtSite};
use crate::{Error, Result};

/// A call edge from a call site to one resolved callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallEdge {
    /// Lexical kind of the call site.
    pub kind: CallKind,
    /// The call site.
    pub site: StmtSite,
    /// The resolved callee.
    pub callee: MethodId,
}

/// Reachable methods plus call edges, in discovery order.
#[derive(Debug, Default)]
pub struct CallGraph {
    reachable: IndexSet<MethodId>,
    edges: IndexSet<CallEdge>,
    callees: FxHashMap<StmtSite, Vec<MethodId>>,
}

impl CallGraph {
    /// Creates an empty call graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a method reachable. Returns `true` if it was new.
    pub fn add_reachable(&mut self, method: MethodId) -> bool {
        self.reachable.insert(method)
    }

    /// Returns `true` if the method is reachable.
    #[must_use]
    pub fn contains(&self, method: MethodId) -> bool {
        self.reachable.contains(&method)
    }

    /// Adds a call edge. Returns `true` if the edge was new.
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if self.edges.insert(edge) {
            self.callees.entry(edge.site).or_default().push(edge.callee);
            true
        } else {
            false
        }
    }

    /// Reachable methods in discovery order.
    pub fn reachable_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.reachable.iter().copied()
    }

    /// Number of reachable methods.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.reachable.len()
    }

    /// All call edges in discovery order.
    pub fn edges(&self) -> impl Iterator<Item = &CallEdge> {
        self.edges.iter()
    }

    /// Callees resolved for a call site, in discovery order.
    #[must_use]
    pub fn callees_of(&self, site: StmtSite) -> &[MethodId] {
        self.callees.get(&site).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates the invocation sites in a method body.
    pub fn call_sites_in<'p>(
        program: &'p Program,
        method: MethodId,
    ) -> impl Iterator<Item = (StmtSite, &'p Invoke)> {
        program
            .body(method)
            .into_iter()
            .flat_map(move |body| body.stmts.iter().enumerate())
            .filter_map(move |(index, stmt)| {
                stmt.as_invoke()
                    .map(|invoke| (StmtSite::new(method, index as u32), invoke))
            })
    }
}

/// Builds a call graph by class hierarchy analysis.
///
/// Starts a breadth-first walk from the program entry method; each
/// reachable method's call sites are resolved against the hierarchy and
/// the discovered callees enqueued.
pub struct ChaBuilder;

impl ChaBuilder {
    /// Builds the CHA call graph of `program`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ir`] if the program has no entry method.
    pub fn build(program: &Program) -> Result<CallGraph> {
        let entry = program
            .entry_method()
            .ok_or_else(|| Error::Ir("no entry method designated".to_string()))?;

        let mut graph = CallGraph::new();
        let mut worklist = std::collections::VecDeque::new();
        worklist.push_back(entry);

        while let Some(method) = worklist.pop_front() {
            if !graph.add_reachable(method) {
                continue;
            }
            for (site, invoke) in CallGraph::call_sites_in(program, method) {
                for callee in Self::resolve(program, invoke) {
                    graph.add_edge(CallEdge {
                        kind: invoke.kind,
                        site,
                        callee,
                    });
                    worklist.push_back(callee);
                }
            }
        }

        Ok(graph)
    }

    /// Resolves the possible callees of a call site.
    ///
    /// Static and special calls dispatch on the declared class;
    /// virtual and interface calls walk the hierarchy below the
    /// declared type and collect every non-abstract dispatch target.
    /// Dynamic sites resolve to nothing.
    #[must_use]
    pub fn resolve(program: &Program, invoke: &Invoke) -> Vec<MethodId> {
        let mut targets: IndexSet<MethodId> = IndexSet::new();
        let declared = invoke.callee.class;
        let subsig = invoke.callee.subsig;

        match invoke.kind {
            CallKind::Static | CallKind::Special => {
                match program.dispatch(declared, subsig) {
                    Some(target) if !program.method(target).is_abstract() => {
                        targets.insert(target);
                    }
                    _ => {
                        debug!(
                            class = program.class(declared).name,
                            subsig = program.subsig_str(subsig),
                            "dispatch found no concrete target"
                        );
                    }
                }
            }
            CallKind::Virtual | CallKind::Interface => {
                let mut queue = std::collections::VecDeque::new();
                let mut visited: IndexSet<ClassId> = IndexSet::new();
                queue.push_back(declared);
                visited.insert(declared);

                if !program.class(declared).is_interface() {
                    if let Some(target) = program.dispatch(declared, subsig) {
                        if !program.method(target).is_abstract() {
                            targets.insert(target);
                        }
                    }
                }

                while let Some(current) = queue.pop_front() {
                    let hierarchy = program.hierarchy();
                    if program.class(current).is_interface() {
                        for &sub in hierarchy.direct_subinterfaces(current) {
                            if visited.insert(sub) {
                                queue.push_back(sub);
                            }
                        }
                        for &implementor in hierarchy.direct_implementors(current) {
                            if visited.insert(implementor) {
                                queue.push_back(implementor);
                                if let Some(target) = program.dispatch(implementor, subsig) {
                                    if !program.method(target).is_abstract() {
                                        targets.insert(target);
                                    }
                                }
                            }
                        }
                    } else {
                        for &sub in hierarchy.direct_subclasses(current) {
                            if visited.insert(sub) {
                                queue.push_back(sub);
                                if let Some(target) = program.dispatch(sub, subsig) {
                                    if !program.method(target).is_abstract() {
                                        targets.insert(target);
                                    }
                                }
                            }
                        }
                    }
                }
            }
            CallKind::Dynamic => {
                debug!("dynamic call site left unresolved");
            }
        }

        targets.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Body, ClassFlags, MethodFlags, MethodRef, ProgramBuilder, Stmt, Type};

    /// Interface I { m() }, A implements I, B implements I; entry calls
    /// i.m() through the interface.
    fn hierarchy_program() -> (Program, MethodId, MethodId) {
        let mut pb = ProgramBuilder::new();
        let object = pb.add_class("Object", None, &[], ClassFlags::empty());
        let iface = pb.add_class("I", Some(object), &[], ClassFlags::INTERFACE);
        let a = pb.add_class("A", Some(object), &[iface], ClassFlags::empty());
        let b = pb.add_class("B", Some(object), &[iface], ClassFlags::empty());

        pb.add_method(
            iface,
            "m",
            "m()",
            MethodFlags::ABSTRACT,
            Type::Void,
        );
        let am = pb.add_method(a, "m", "m()", MethodFlags::empty(), Type::Void);
        let bm = pb.add_method(b, "m", "m()", MethodFlags::empty(), Type::Void);
        pb.set_body(am, Body { stmts: vec![Stmt::Return { value: None }], ..Body::default() });
        pb.set_body(bm, Body { stmts: vec![Stmt::Return { value: None }], ..Body::default() });

        let main_class = pb.add_class("Main", Some(object), &[], ClassFlags::empty());
        let main = pb.add_method(main_class, "main", "main()", MethodFlags::STATIC, Type::Void);
        let i = pb.add_var(main, "i", Type::Reference(iface));
        let subsig = pb.subsig("m()");
        pb.set_body(
            main,
            Body {
                stmts: vec![
                    Stmt::Invoke(Invoke {
                        result: None,
                        kind: CallKind::Interface,
                        callee: MethodRef {
                            class: iface,
                            subsig,
                        },
                        receiver: Some(i),
                        args: vec![],
                    }),
                    Stmt::Return { value: None },
                ],
                ..Body::default()
            },
        );
        pb.set_entry(main);
        (pb.finish().unwrap(), am, bm)
    }

    #[test]
    fn test_interface_call_resolves_to_all_implementors() {
        let (program, am, bm) = hierarchy_program();
        let graph = ChaBuilder::build(&program).unwrap();

        let main = program.entry_method().unwrap();
        let site = StmtSite::new(main, 0);
        assert_eq!(graph.callees_of(site), &[am, bm]);
        assert!(graph.contains(am));
        assert!(graph.contains(bm));
    }

    #[test]
    fn test_edges_carry_call_kind() {
        let (program, _, _) = hierarchy_program();
        let graph = ChaBuilder::build(&program).unwrap();
        assert!(graph.edges().all(|e| e.kind == CallKind::Interface));
        assert_eq!(graph.edges().count(), 2);
    }
}
