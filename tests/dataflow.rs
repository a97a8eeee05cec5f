//! End-to-end dataflow scenarios: constant propagation, dead code,
//! and the alias-aware interprocedural analysis.

use irscope::prelude::*;

/// `int f(int p) { a = 1; b = 2; c = a + b; if (c == 3) return c;
/// else return 0; }`
fn constant_branch_program() -> (Program, MethodId, [VarId; 4]) {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let f = pb.add_method(object, "f", "f(int)", MethodFlags::STATIC, Type::Int);
    let p = pb.add_var(f, "p", Type::Int);
    let a = pb.add_var(f, "a", Type::Int);
    let b = pb.add_var(f, "b", Type::Int);
    let c = pb.add_var(f, "c", Type::Int);
    let c3 = pb.add_var(f, "c3", Type::Int);
    let z = pb.add_var(f, "z", Type::Int);
    pb.set_body(
        f,
        Body {
            stmts: vec![
                // 0: a := 1
                Stmt::Assign {
                    lhs: a,
                    rhs: Exp::IntLiteral(1),
                },
                // 1: b := 2
                Stmt::Assign {
                    lhs: b,
                    rhs: Exp::IntLiteral(2),
                },
                // 2: c := a + b
                Stmt::Assign {
                    lhs: c,
                    rhs: Exp::Binary {
                        op: BinaryOp::Add,
                        lhs: a,
                        rhs: b,
                    },
                },
                // 3: c3 := 3
                Stmt::Assign {
                    lhs: c3,
                    rhs: Exp::IntLiteral(3),
                },
                // 4: if (c == c3) goto 7
                Stmt::If {
                    op: BinaryOp::Eq,
                    lhs: c,
                    rhs: c3,
                    target: 7,
                },
                // 5: z := 0
                Stmt::Assign {
                    lhs: z,
                    rhs: Exp::IntLiteral(0),
                },
                // 6: return z
                Stmt::Return { value: Some(z) },
                // 7: return c
                Stmt::Return { value: Some(c) },
            ],
            params: vec![p],
            return_vars: vec![z, c],
            ..Body::default()
        },
    );
    pb.set_entry(f);
    (pb.finish().unwrap(), f, [a, b, c, p])
}

#[test]
fn constants_at_the_live_return() {
    let (program, f, [a, b, c, p]) = constant_branch_program();
    let cfg = CfgBuilder::build(&program, f);
    let analysis = ConstantPropagation::new(&program, f);
    let constants = WorklistSolver::new(&analysis).solve(&cfg);

    let at_return = constants.in_fact(CfgNodeId::stmt(7));
    assert_eq!(at_return.get(a), Value::Const(1));
    assert_eq!(at_return.get(b), Value::Const(2));
    assert_eq!(at_return.get(c), Value::Const(3));
    assert_eq!(at_return.get(p), Value::Nac);
}

#[test]
fn untaken_else_branch_is_dead() {
    let (program, f, _) = constant_branch_program();
    let dead = DeadCodeDetection::analyze(&program, f);
    let indices: Vec<u32> = dead.iter().map(|site| site.index).collect();
    assert_eq!(indices, vec![5, 6]);
}

/// `int g(int p) { z = 0; return p / z; }`: the division by a
/// constant zero evaluates to Undef, not Nac.
#[test]
fn divide_by_constant_zero() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let g = pb.add_method(object, "g", "g(int)", MethodFlags::STATIC, Type::Int);
    let p = pb.add_var(g, "p", Type::Int);
    let z = pb.add_var(g, "z", Type::Int);
    let r = pb.add_var(g, "r", Type::Int);
    pb.set_body(
        g,
        Body {
            stmts: vec![
                Stmt::Assign {
                    lhs: z,
                    rhs: Exp::IntLiteral(0),
                },
                Stmt::Assign {
                    lhs: r,
                    rhs: Exp::Binary {
                        op: BinaryOp::Div,
                        lhs: p,
                        rhs: z,
                    },
                },
                Stmt::Return { value: Some(r) },
            ],
            params: vec![p],
            return_vars: vec![r],
            ..Body::default()
        },
    );
    pb.set_entry(g);
    let program = pb.finish().unwrap();

    let cfg = CfgBuilder::build(&program, g);
    let analysis = ConstantPropagation::new(&program, g);
    let constants = WorklistSolver::new(&analysis).solve(&cfg);

    let after_div = constants.out_fact(CfgNodeId::stmt(1));
    assert_eq!(after_div.get(p), Value::Nac);
    assert_eq!(after_div.get(z), Value::Const(0));
    assert_eq!(after_div.get(r), Value::Undef);
}

/// `switch (1) { case 1: x = 1; break; case 2: x = 2; break;
/// default: x = 3; }` marks the case-2 and default statements dead.
#[test]
fn constant_switch_prunes_cases() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let m = pb.add_method(object, "m", "m()", MethodFlags::STATIC, Type::Int);
    let k = pb.add_var(m, "k", Type::Int);
    let x = pb.add_var(m, "x", Type::Int);
    pb.set_body(
        m,
        Body {
            stmts: vec![
                // 0: k := 1
                Stmt::Assign {
                    lhs: k,
                    rhs: Exp::IntLiteral(1),
                },
                // 1: switch (k) { 1 -> 2, 2 -> 4, default -> 6 }
                Stmt::Switch {
                    key: k,
                    cases: vec![(1, 2), (2, 4)],
                    default: 6,
                },
                // 2: x := 1
                Stmt::Assign {
                    lhs: x,
                    rhs: Exp::IntLiteral(1),
                },
                // 3: goto 7
                Stmt::Goto { target: 7 },
                // 4: x := 2
                Stmt::Assign {
                    lhs: x,
                    rhs: Exp::IntLiteral(2),
                },
                // 5: goto 7
                Stmt::Goto { target: 7 },
                // 6: x := 3
                Stmt::Assign {
                    lhs: x,
                    rhs: Exp::IntLiteral(3),
                },
                // 7: return x
                Stmt::Return { value: Some(x) },
            ],
            return_vars: vec![x],
            ..Body::default()
        },
    );
    pb.set_entry(m);
    let program = pb.finish().unwrap();

    let dead = DeadCodeDetection::analyze(&program, m);
    let indices: Vec<u32> = dead.iter().map(|site| site.index).collect();
    assert_eq!(indices, vec![4, 5, 6]);
}

/// Constants flow through calls: `x = 41; r = inc(x)` where
/// `inc(p) { one = 1; q = p + one; return q; }` gives r = 42.
#[test]
fn interprocedural_constant_return() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let cls = pb.add_class("Main", Some(object), &[], ClassFlags::empty());

    let inc = pb.add_method(cls, "inc", "inc(int)", MethodFlags::STATIC, Type::Int);
    let p = pb.add_var(inc, "p", Type::Int);
    let one = pb.add_var(inc, "one", Type::Int);
    let q = pb.add_var(inc, "q", Type::Int);
    pb.set_body(
        inc,
        Body {
            stmts: vec![
                Stmt::Assign {
                    lhs: one,
                    rhs: Exp::IntLiteral(1),
                },
                Stmt::Assign {
                    lhs: q,
                    rhs: Exp::Binary {
                        op: BinaryOp::Add,
                        lhs: p,
                        rhs: one,
                    },
                },
                Stmt::Return { value: Some(q) },
            ],
            params: vec![p],
            return_vars: vec![q],
            ..Body::default()
        },
    );

    let main = pb.add_method(cls, "main", "main()", MethodFlags::STATIC, Type::Void);
    let x = pb.add_var(main, "x", Type::Int);
    let r = pb.add_var(main, "r", Type::Int);
    let inc_subsig = pb.subsig("inc(int)");
    pb.set_body(
        main,
        Body {
            stmts: vec![
                Stmt::Assign {
                    lhs: x,
                    rhs: Exp::IntLiteral(41),
                },
                Stmt::Invoke(Invoke {
                    result: Some(r),
                    kind: CallKind::Static,
                    callee: MethodRef {
                        class: cls,
                        subsig: inc_subsig,
                    },
                    receiver: None,
                    args: vec![x],
                }),
                Stmt::Return { value: None },
            ],
            ..Body::default()
        },
    );
    pb.set_entry(main);
    let program = pb.finish().unwrap();

    let pta = PointerAnalysis::run_with(&program, ContextSelector::Insensitive, None).unwrap();
    let cha = ChaBuilder::build(&program).unwrap();
    let icfg = IcfgBuilder::build(&program, &cha);
    let result = solve_inter_constants(&program, &icfg, &pta);

    let return_node = icfg
        .node_of_site(StmtSite::new(main, 2))
        .expect("return node");
    assert_eq!(result.in_fact(return_node).get(r), Value::Const(42));
    assert_eq!(result.in_fact(return_node).get(x), Value::Const(41));
}

/// Heap values flow through aliases: a store through `a` is read
/// back through its alias `b`.
#[test]
fn alias_aware_field_load() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let cls = pb.add_class("C", Some(object), &[], ClassFlags::empty());
    let field = pb.add_field(cls, "f", Type::Int);

    let main = pb.add_method(cls, "main", "main()", MethodFlags::STATIC, Type::Int);
    let x = pb.add_var(main, "x", Type::Int);
    let a = pb.add_var(main, "a", Type::Reference(cls));
    let b = pb.add_var(main, "b", Type::Reference(cls));
    let y = pb.add_var(main, "y", Type::Int);
    pb.set_body(
        main,
        Body {
            stmts: vec![
                // 0: x := 5
                Stmt::Assign {
                    lhs: x,
                    rhs: Exp::IntLiteral(5),
                },
                // 1: a := new C
                Stmt::New { lhs: a, class: cls },
                // 2: b := a
                Stmt::Assign {
                    lhs: b,
                    rhs: Exp::Var(a),
                },
                // 3: a.f := x
                Stmt::StoreField {
                    base: Some(a),
                    field,
                    rhs: x,
                },
                // 4: y := b.f
                Stmt::LoadField {
                    lhs: y,
                    base: Some(b),
                    field,
                },
                // 5: return y
                Stmt::Return { value: Some(y) },
            ],
            return_vars: vec![y],
            ..Body::default()
        },
    );
    pb.set_entry(main);
    let program = pb.finish().unwrap();

    let pta = PointerAnalysis::run_with(&program, ContextSelector::Insensitive, None).unwrap();
    assert!(pta.is_alias(a, b));

    let cha = ChaBuilder::build(&program).unwrap();
    let icfg = IcfgBuilder::build(&program, &cha);
    let result = solve_inter_constants(&program, &icfg, &pta);

    let load_node = icfg.node_of_site(StmtSite::new(main, 4)).unwrap();
    assert_eq!(result.out_fact(load_node).get(y), Value::Const(5));
}

/// An array store with Undef index is unreachable and must not feed
/// any load; compatible constant indexes do.
#[test]
fn array_index_compatibility() {
    let mut pb = ProgramBuilder::new();
    let object = pb.add_class("Object", None, &[], ClassFlags::empty());
    let cls = pb.add_class("Main", Some(object), &[], ClassFlags::empty());

    let main = pb.add_method(cls, "main", "main()", MethodFlags::STATIC, Type::Int);
    let arr = pb.add_var(main, "arr", Type::Array(Box::new(Type::Int)));
    let i = pb.add_var(main, "i", Type::Int);
    let v = pb.add_var(main, "v", Type::Int);
    let y = pb.add_var(main, "y", Type::Int);
    pb.set_body(
        main,
        Body {
            stmts: vec![
                // 0: arr := new int[]
                Stmt::New {
                    lhs: arr,
                    class: object,
                },
                // 1: i := 0
                Stmt::Assign {
                    lhs: i,
                    rhs: Exp::IntLiteral(0),
                },
                // 2: v := 7
                Stmt::Assign {
                    lhs: v,
                    rhs: Exp::IntLiteral(7),
                },
                // 3: arr[i] := v
                Stmt::StoreArray {
                    base: arr,
                    index: i,
                    rhs: v,
                },
                // 4: y := arr[i]
                Stmt::LoadArray {
                    lhs: y,
                    base: arr,
                    index: i,
                },
                // 5: return y
                Stmt::Return { value: Some(y) },
            ],
            return_vars: vec![y],
            ..Body::default()
        },
    );
    pb.set_entry(main);
    let program = pb.finish().unwrap();

    let pta = PointerAnalysis::run_with(&program, ContextSelector::Insensitive, None).unwrap();
    let cha = ChaBuilder::build(&program).unwrap();
    let icfg = IcfgBuilder::build(&program, &cha);
    let result = solve_inter_constants(&program, &icfg, &pta);

    let load_node = icfg.node_of_site(StmtSite::new(main, 4)).unwrap();
    assert_eq!(result.out_fact(load_node).get(y), Value::Const(7));
}
