//! Shared test fixtures and cross-module property tests.

use crate::ir::{
    Body, CallKind, ClassFlags, Invoke, MethodFlags, MethodId, MethodRef, Program,
    ProgramBuilder, Stmt, Type, VarId,
};

/// Variables of interest in the identity-chain fixture.
pub(crate) struct IdChain {
    pub program: Program,
    pub main: MethodId,
    pub a: VarId,
    pub b: VarId,
}

/// `a = id(new O1()); b = id(new O2());` with a static identity
/// method. The classic context-sensitivity separator.
pub(crate) fn id_chain_program() -> IdChain {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let o1 = pb.add_class("O1", Some(object), &[], ClassFlags::empty());
    let o2 = pb.add_class("O2", Some(object), &[], ClassFlags::empty());
    let util = pb.add_class("Util", Some(object), &[], ClassFlags::empty());

    let id = pb.add_method(
        util,
        "id",
        "id(Object)",
        MethodFlags::STATIC,
        Type::Reference(object),
    );
    let x = pb.add_var(id, "x", Type::Reference(object));
    pb.set_body(
        id,
        Body {
            stmts: vec![Stmt::Return { value: Some(x) }],
            params: vec![x],
            return_vars: vec![x],
            ..Body::default()
        },
    );

    let main_class = pb.add_class("Main", Some(object), &[], ClassFlags::empty());
    let main = pb.add_method(
        main_class,
        "main",
        "main()",
        MethodFlags::STATIC,
        Type::Void,
    );
    let t1 = pb.add_var(main, "t1", Type::Reference(o1));
    let t2 = pb.add_var(main, "t2", Type::Reference(o2));
    let a = pb.add_var(main, "a", Type::Reference(object));
    let b = pb.add_var(main, "b", Type::Reference(object));
    let id_subsig = pb.subsig("id(Object)");

    pb.set_body(
        main,
        Body {
            stmts: vec![
                Stmt::New { lhs: t1, class: o1 },
                Stmt::Invoke(Invoke {
                    result: Some(a),
                    kind: CallKind::Static,
                    callee: MethodRef {
                        class: util,
                        subsig: id_subsig,
                    },
                    receiver: None,
                    args: vec![t1],
                }),
                Stmt::New { lhs: t2, class: o2 },
                Stmt::Invoke(Invoke {
                    result: Some(b),
                    kind: CallKind::Static,
                    callee: MethodRef {
                        class: util,
                        subsig: id_subsig,
                    },
                    receiver: None,
                    args: vec![t2],
                }),
                Stmt::Return { value: None },
            ],
            ..Body::default()
        },
    );
    pb.set_entry(main);

    IdChain {
        program: pb.finish().unwrap(),
        main,
        a,
        b,
    }
}

#[cfg(test)]
mod laws {
    use super::*;
    use crate::pta::{ContextSelector, ObjId, PointerAnalysis, PointerAnalysisResult};

    fn snapshot(result: &PointerAnalysisResult) -> Vec<(VarId, Vec<ObjId>)> {
        result
            .iter_var_points_to()
            .map(|(var, objs)| (var, objs.iter().copied().collect()))
            .collect()
    }

    /// Two runs over the same input produce identical tables, down to
    /// iteration order.
    #[test]
    fn test_pta_determinism() {
        let fixture = id_chain_program();
        let first =
            PointerAnalysis::run_with(&fixture.program, ContextSelector::KCallSite(1), None)
                .unwrap();
        let second =
            PointerAnalysis::run_with(&fixture.program, ContextSelector::KCallSite(1), None)
                .unwrap();

        assert_eq!(snapshot(&first), snapshot(&second));

        let edges = |result: &PointerAnalysisResult| {
            result
                .call_graph()
                .edges()
                .map(|edge| (edge.kind, edge.site, edge.callee))
                .collect::<Vec<_>>()
        };
        assert_eq!(edges(&first), edges(&second));
    }

    /// Every object the sensitive analysis finds is also found by the
    /// insensitive one.
    #[test]
    fn test_cs_is_subset_of_ci() {
        let fixture = id_chain_program();
        let ci = PointerAnalysis::run_with(&fixture.program, ContextSelector::Insensitive, None)
            .unwrap();
        let cs =
            PointerAnalysis::run_with(&fixture.program, ContextSelector::KCallSite(1), None)
                .unwrap();

        for (var, objs) in cs.iter_var_points_to() {
            let wider = ci.var_points_to(var).unwrap();
            for obj in objs {
                assert!(wider.contains(obj), "{var:?} lost {obj:?} in the CI view");
            }
        }
    }
}
