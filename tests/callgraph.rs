//! Class-hierarchy-analysis call graph scenarios.

use irscope::prelude::*;

/// Interface `I { void m(); }` with implementors `A` and `B`; the
/// entry calls `i.m()` through the interface.
fn diamond_hierarchy() -> (Program, MethodId, MethodId, MethodId) {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let iface = pb.add_class("I", Some(object), &[], ClassFlags::INTERFACE);
    let a = pb.add_class("A", Some(object), &[iface], ClassFlags::empty());
    let b = pb.add_class("B", Some(object), &[iface], ClassFlags::empty());

    pb.add_method(iface, "m", "m()", MethodFlags::ABSTRACT, Type::Void);
    let am = pb.add_method(a, "m", "m()", MethodFlags::empty(), Type::Void);
    let bm = pb.add_method(b, "m", "m()", MethodFlags::empty(), Type::Void);
    for m in [am, bm] {
        pb.set_body(
            m,
            Body {
                stmts: vec![Stmt::Return { value: None }],
                ..Body::default()
            },
        );
    }

    let main_class = pb.add_class("Main", Some(object), &[], ClassFlags::empty());
    let main = pb.add_method(
        main_class,
        "main",
        "main()",
        MethodFlags::STATIC,
        Type::Void,
    );
    let i = pb.add_var(main, "i", Type::Reference(iface));
    let m_subsig = pb.subsig("m()");
    pb.set_body(
        main,
        Body {
            stmts: vec![
                Stmt::Invoke(Invoke {
                    result: None,
                    kind: CallKind::Interface,
                    callee: MethodRef {
                        class: iface,
                        subsig: m_subsig,
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
    (pb.finish().unwrap(), main, am, bm)
}

#[test]
fn interface_call_resolves_to_every_implementor() {
    let (program, main, am, bm) = diamond_hierarchy();
    let graph = ChaBuilder::build(&program).unwrap();

    assert_eq!(graph.callees_of(StmtSite::new(main, 0)), &[am, bm]);
    let reachable: Vec<MethodId> = graph.reachable_methods().collect();
    assert_eq!(reachable, vec![main, am, bm]);
}

/// A virtual call on a class dispatches into overrides below the
/// declared class, and inherited methods resolve up the superclass
/// chain.
#[test]
fn virtual_call_with_inherited_method() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let base = pb.add_class("Base", Some(object), &[], ClassFlags::empty());
    let mid = pb.add_class("Mid", Some(base), &[], ClassFlags::empty());
    let leaf = pb.add_class("Leaf", Some(mid), &[], ClassFlags::empty());

    let base_m = pb.add_method(base, "m", "m()", MethodFlags::empty(), Type::Void);
    let leaf_m = pb.add_method(leaf, "m", "m()", MethodFlags::empty(), Type::Void);
    for m in [base_m, leaf_m] {
        pb.set_body(
            m,
            Body {
                stmts: vec![Stmt::Return { value: None }],
                ..Body::default()
            },
        );
    }

    let main_class = pb.add_class("Main", Some(object), &[], ClassFlags::empty());
    let main = pb.add_method(
        main_class,
        "main",
        "main()",
        MethodFlags::STATIC,
        Type::Void,
    );
    let recv = pb.add_var(main, "recv", Type::Reference(base));
    let m_subsig = pb.subsig("m()");
    pb.set_body(
        main,
        Body {
            stmts: vec![
                Stmt::Invoke(Invoke {
                    result: None,
                    kind: CallKind::Virtual,
                    callee: MethodRef {
                        class: base,
                        subsig: m_subsig,
                    },
                    receiver: Some(recv),
                    args: vec![],
                }),
                Stmt::Return { value: None },
            ],
            ..Body::default()
        },
    );
    pb.set_entry(main);
    let program = pb.finish().unwrap();

    let graph = ChaBuilder::build(&program).unwrap();
    // Base.m covers Base and Mid receivers; Leaf.m overrides it.
    // Mid declares nothing, so dispatch walks up to Base.m.
    assert_eq!(
        graph.callees_of(StmtSite::new(main, 0)),
        &[base_m, leaf_m]
    );
}

/// CHA over-approximates: the pointer analysis, which sees that the
/// receiver only ever holds an `A`, resolves a subset of CHA's
/// targets.
#[test]
fn cha_contains_pointer_analysis_callees() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let iface = pb.add_class("I", Some(object), &[], ClassFlags::INTERFACE);
    let a = pb.add_class("A", Some(object), &[iface], ClassFlags::empty());
    let b = pb.add_class("B", Some(object), &[iface], ClassFlags::empty());

    pb.add_method(iface, "m", "m()", MethodFlags::ABSTRACT, Type::Void);
    let am = pb.add_method(a, "m", "m()", MethodFlags::empty(), Type::Void);
    let bm = pb.add_method(b, "m", "m()", MethodFlags::empty(), Type::Void);
    for (m, cls) in [(am, a), (bm, b)] {
        let this = pb.add_var(m, "this", Type::Reference(cls));
        pb.set_body(
            m,
            Body {
                stmts: vec![Stmt::Return { value: None }],
                this: Some(this),
                ..Body::default()
            },
        );
    }

    let main_class = pb.add_class("Main", Some(object), &[], ClassFlags::empty());
    let main = pb.add_method(
        main_class,
        "main",
        "main()",
        MethodFlags::STATIC,
        Type::Void,
    );
    let i = pb.add_var(main, "i", Type::Reference(iface));
    let m_subsig = pb.subsig("m()");
    pb.set_body(
        main,
        Body {
            stmts: vec![
                Stmt::New { lhs: i, class: a },
                Stmt::Invoke(Invoke {
                    result: None,
                    kind: CallKind::Interface,
                    callee: MethodRef {
                        class: iface,
                        subsig: m_subsig,
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
    let program = pb.finish().unwrap();

    let cha = ChaBuilder::build(&program).unwrap();
    let pta = PointerAnalysis::run_with(&program, ContextSelector::Insensitive, None).unwrap();

    let site = StmtSite::new(main, 1);
    // the pointer analysis resolves only A.m, CHA both
    assert_eq!(pta.call_graph().callees_of(site), &[am]);
    assert_eq!(cha.callees_of(site), &[am, bm]);
    for edge in pta.call_graph().edges() {
        assert!(cha.callees_of(edge.site).contains(&edge.callee));
    }
}
