use crate::ast::{BinOp, CaseLabel, Expr, IncDecOp, Stmt, SwitchGroup, Unit};
use crate::typ::typed::{TypedExpr, TypedStmt, TypedStmtKind, TypedUnit};
use crate::typ::{NumericKind, SemanticErrors, Type};
use crate::vm::{CodeUnit, CompileOptions, Compiler, Cond, Op};

const INT: NumericKind = NumericKind::Int;

fn compile(unit: Unit) -> CodeUnit {
    Compiler::default().compile(&unit).expect("compile")
}

fn ops(body: Vec<Stmt>) -> Vec<Op> {
    compile(Unit::new("T", body)).ops
}

fn field_ops(field: Type, body: Vec<Stmt>) -> Vec<Op> {
    compile(Unit::new("T", body).with_field("f", field)).ops
}

fn int_local(name: &str, value: i32) -> Stmt {
    Stmt::local(name, Type::Int, Some(Expr::int(value)))
}

fn inc_dec(op: IncDecOp, name: &str) -> Expr {
    Expr::inc_dec(op, Expr::var(name))
}

fn lt(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(BinOp::Lt, lhs, rhs)
}

/// Absolute target of the branch at `pc`.
fn target(ops: &[Op], pc: usize) -> usize {
    let ofs = match &ops[pc] {
        Op::Goto(ofs) | Op::If(_, ofs) | Op::IfICmp(_, ofs) => *ofs,
        other => panic!("no single target: {}", other),
    };
    (pc as i64 + ofs as i64) as usize
}

#[test]
fn discarded_post_increment_of_local_is_a_single_inc() {
    let ops = ops(vec![int_local("x", 5), Stmt::expr(inc_dec(IncDecOp::PostInc, "x"))]);
    assert_eq!(
        ops,
        vec![Op::IConst(5), Op::Store(INT, 1), Op::Inc { slot: 1, delta: 1 }, Op::Return]
    );
}

#[test]
fn post_increment_of_local_loads_before_inc() {
    let ops = ops(vec![
        int_local("x", 5),
        Stmt::local("y", Type::Int, Some(inc_dec(IncDecOp::PostInc, "x"))),
    ]);
    assert_eq!(
        ops,
        vec![
            Op::IConst(5),
            Op::Store(INT, 1),
            Op::Load(INT, 1),
            Op::Inc { slot: 1, delta: 1 },
            Op::Store(INT, 2),
            Op::Return,
        ]
    );
}

#[test]
fn pre_decrement_of_local_applies_inc_before_load() {
    let ops = ops(vec![
        int_local("x", 5),
        Stmt::local("y", Type::Int, Some(inc_dec(IncDecOp::PreDec, "x"))),
    ]);
    assert_eq!(
        ops,
        vec![
            Op::IConst(5),
            Op::Store(INT, 1),
            Op::Inc { slot: 1, delta: -1 },
            Op::Load(INT, 1),
            Op::Store(INT, 2),
            Op::Return,
        ]
    );
}

#[test]
fn pre_decrement_of_field_duplicates_after_the_mutation() {
    let ops = field_ops(
        Type::Int,
        vec![Stmt::local("y", Type::Int, Some(inc_dec(IncDecOp::PreDec, "f")))],
    );
    assert_eq!(
        ops,
        vec![
            Op::LoadThis,
            Op::Dup,
            Op::GetField(0),
            Op::IConst(1),
            Op::Sub(INT),
            Op::DupX1,
            Op::PutField(0),
            Op::Store(INT, 1),
            Op::Return,
        ]
    );
}

#[test]
fn post_decrement_of_field_duplicates_before_the_mutation() {
    let ops = field_ops(
        Type::Int,
        vec![Stmt::local("y", Type::Int, Some(inc_dec(IncDecOp::PostDec, "f")))],
    );
    assert_eq!(
        ops,
        vec![
            Op::LoadThis,
            Op::Dup,
            Op::GetField(0),
            Op::DupX1,
            Op::IConst(1),
            Op::Sub(INT),
            Op::PutField(0),
            Op::Store(INT, 1),
            Op::Return,
        ]
    );
}

#[test]
fn discarded_field_increment_has_no_duplicate() {
    for op in [IncDecOp::PreInc, IncDecOp::PostInc] {
        let ops = field_ops(Type::Int, vec![Stmt::expr(inc_dec(op, "f"))]);
        assert_eq!(
            ops,
            vec![
                Op::LoadThis,
                Op::Dup,
                Op::GetField(0),
                Op::IConst(1),
                Op::Add(INT),
                Op::PutField(0),
                Op::Return,
            ]
        );
    }
}

#[test]
fn unit_constant_matches_the_arithmetic_kind() {
    let ops = field_ops(Type::Long, vec![Stmt::expr(inc_dec(IncDecOp::PreInc, "f"))]);
    assert!(ops.contains(&Op::LConst(1)));
    assert!(ops.contains(&Op::Add(NumericKind::Long)));

    let ops = field_ops(Type::Double, vec![Stmt::expr(inc_dec(IncDecOp::PostDec, "f"))]);
    assert!(ops.contains(&Op::DConst(1.0)));
    assert!(ops.contains(&Op::Sub(NumericKind::Double)));
}

#[test]
fn inc_is_used_for_every_numeric_local_kind() {
    let ops = ops(vec![
        Stmt::local("d", Type::Double, Some(Expr::double(1.5))),
        Stmt::expr(inc_dec(IncDecOp::PreDec, "d")),
    ]);
    assert_eq!(
        ops,
        vec![
            Op::DConst(1.5),
            Op::Store(NumericKind::Double, 1),
            Op::Inc { slot: 1, delta: -1 },
            Op::Return,
        ]
    );
}

#[test]
fn negate_selects_the_typed_instruction() {
    let ops = ops(vec![
        Stmt::local("a", Type::Long, Some(Expr::neg(Expr::long(3)))),
        Stmt::local("b", Type::Double, Some(Expr::neg(Expr::double(0.5)))),
        Stmt::local("c", Type::Int, Some(Expr::neg(Expr::int(1)))),
    ]);
    let negs: Vec<&Op> = ops.iter().filter(|op| matches!(op, Op::Neg(_))).collect();
    assert_eq!(
        negs,
        vec![
            &Op::Neg(NumericKind::Long),
            &Op::Neg(NumericKind::Double),
            &Op::Neg(INT)
        ]
    );
}

#[test]
fn assignment_duplicates_only_when_its_value_is_used() {
    let ops = ops(vec![
        int_local("x", 0),
        int_local("y", 0),
        Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(3))),
        Stmt::expr(Expr::assign(
            Expr::var("y"),
            Expr::assign(Expr::var("x"), Expr::int(4)),
        )),
    ]);
    assert_eq!(
        &ops[4..],
        &[
            Op::IConst(3),
            Op::Store(INT, 1),
            Op::IConst(4),
            Op::Dup,
            Op::Store(INT, 1),
            Op::Store(INT, 2),
            Op::Return,
        ]
    );
}

#[test]
fn field_assignment_goes_through_the_receiver() {
    let ops = field_ops(Type::Int, vec![Stmt::expr(Expr::assign(Expr::field("f"), Expr::int(9)))]);
    assert_eq!(ops, vec![Op::LoadThis, Op::IConst(9), Op::PutField(0), Op::Return]);
}

#[test]
fn logical_not_in_branch_position_costs_nothing() {
    let plain = ops(vec![
        int_local("x", 5),
        Stmt::while_loop(lt(Expr::var("x"), Expr::int(3)), Stmt::expr(inc_dec(IncDecOp::PostInc, "x"))),
    ]);
    let negated = ops(vec![
        int_local("x", 5),
        Stmt::while_loop(
            Expr::not(lt(Expr::var("x"), Expr::int(3))),
            Stmt::expr(inc_dec(IncDecOp::PostInc, "x")),
        ),
    ]);
    assert_eq!(plain.len(), negated.len());
    assert!(plain.iter().any(|op| matches!(op, Op::IfICmp(Cond::Ge, _))));
    assert!(negated.iter().any(|op| matches!(op, Op::IfICmp(Cond::Lt, _))));
    // no boolean is ever pushed
    assert!(!negated.contains(&Op::IConst(1)));
    assert!(!negated.contains(&Op::IConst(0)));
}

#[test]
fn double_negation_folds_into_polarity() {
    let once = ops(vec![
        Stmt::local("b", Type::Boolean, Some(Expr::bool(true))),
        Stmt::while_loop(Expr::var("b"), Stmt::expr(Expr::assign(Expr::var("b"), Expr::bool(false)))),
    ]);
    let twice = ops(vec![
        Stmt::local("b", Type::Boolean, Some(Expr::bool(true))),
        Stmt::while_loop(
            Expr::not(Expr::not(Expr::var("b"))),
            Stmt::expr(Expr::assign(Expr::var("b"), Expr::bool(false))),
        ),
    ]);
    assert_eq!(once, twice);
}

#[test]
fn logical_not_as_a_value_is_materialized() {
    let ops = ops(vec![
        int_local("x", 5),
        Stmt::local(
            "b",
            Type::Boolean,
            Some(Expr::not(lt(Expr::var("x"), Expr::int(3)))),
        ),
    ]);
    assert_eq!(
        &ops[2..],
        &[
            Op::Load(INT, 1),
            Op::IConst(3),
            Op::IfICmp(Cond::Lt, 3),
            Op::IConst(1),
            Op::Goto(2),
            Op::IConst(0),
            Op::Store(INT, 2),
            Op::Return,
        ]
    );
}

#[test]
fn for_loop_uses_a_single_entry_jump_and_tests_at_the_bottom() {
    let ops = ops(vec![
        int_local("s", 0),
        Stmt::for_loop(
            vec![int_local("i", 0)],
            Some(lt(Expr::var("i"), Expr::int(3))),
            vec![Stmt::expr(Expr::assign(
                Expr::var("i"),
                Expr::binary(BinOp::Add, Expr::var("i"), Expr::int(1)),
            ))],
            Some(Stmt::expr(Expr::assign(
                Expr::var("s"),
                Expr::binary(BinOp::Add, Expr::var("s"), Expr::var("i")),
            ))),
        ),
    ]);
    assert_eq!(
        ops,
        vec![
            Op::IConst(0),
            Op::Store(INT, 1),
            Op::IConst(0),
            Op::Store(INT, 2),
            Op::Goto(9),
            Op::Load(INT, 1),
            Op::Load(INT, 2),
            Op::Add(INT),
            Op::Store(INT, 1),
            Op::Load(INT, 2),
            Op::IConst(1),
            Op::Add(INT),
            Op::Store(INT, 2),
            Op::Load(INT, 2),
            Op::IConst(3),
            Op::IfICmp(Cond::Lt, -10),
            Op::Return,
        ]
    );
    assert_eq!(ops.iter().filter(|op| matches!(op, Op::Goto(_))).count(), 1);
}

#[test]
fn empty_for_loops_forever_until_break() {
    let ops = ops(vec![Stmt::for_loop(vec![], None, vec![], Some(Stmt::break_stmt()))]);
    assert_eq!(ops, vec![Op::Goto(2), Op::Goto(2), Op::Goto(-1), Op::Return]);
}

#[test]
fn continue_in_for_jumps_to_the_update() {
    let ops = ops(vec![Stmt::for_loop(
        vec![int_local("i", 0)],
        Some(lt(Expr::var("i"), Expr::int(3))),
        vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "i"))],
        Some(Stmt::continue_stmt()),
    )]);
    // 0 iconst, 1 istore, 2 goto test, 3 goto cont, 4 inc, 5 iload ...
    assert_eq!(target(&ops, 3), 4);
    assert_eq!(ops[4], Op::Inc { slot: 1, delta: 1 });
}

#[test]
fn do_while_branches_back_when_true() {
    let ops = ops(vec![
        int_local("n", 0),
        Stmt::do_while(
            Stmt::expr(inc_dec(IncDecOp::PostInc, "n")),
            lt(Expr::var("n"), Expr::int(3)),
        ),
    ]);
    assert_eq!(
        ops,
        vec![
            Op::IConst(0),
            Op::Store(INT, 1),
            Op::Inc { slot: 1, delta: 1 },
            Op::Load(INT, 1),
            Op::IConst(3),
            Op::IfICmp(Cond::Lt, -3),
            Op::Return,
        ]
    );
}

#[test]
fn continue_in_do_while_goes_to_the_condition() {
    let ops = ops(vec![
        int_local("n", 0),
        Stmt::do_while(
            Stmt::block(vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "n")), Stmt::continue_stmt()]),
            lt(Expr::var("n"), Expr::int(3)),
        ),
    ]);
    // the continue is a forward jump onto the condition, never back to the body start
    assert_eq!(ops[3], Op::Goto(1));
    assert_eq!(ops[4], Op::Load(INT, 1));
}

fn fall_through_switch(with_default: bool) -> Vec<Stmt> {
    let mut groups = vec![
        SwitchGroup::new(
            vec![CaseLabel::case(1), CaseLabel::case(2)],
            vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "a"))],
        ),
        SwitchGroup::new(
            vec![CaseLabel::case(3)],
            vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "b")), Stmt::break_stmt()],
        ),
    ];
    if with_default {
        groups.push(SwitchGroup::new(
            vec![CaseLabel::Default],
            vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "c"))],
        ));
    }
    vec![
        int_local("a", 0),
        int_local("b", 0),
        int_local("c", 0),
        Stmt::switch(Expr::var("a"), groups),
    ]
}

#[test]
fn switch_builds_a_dense_table_and_lays_groups_out_in_order() {
    let ops = ops(fall_through_switch(true));
    // 0..6 locals, 6 iload a, 7 tableswitch, 8 inc a, 9 inc b, 10 goto end, 11 inc c, 12 return
    let Op::TableSwitch { low, default, offsets } = &ops[7] else {
        panic!("expected tableswitch, got {}", ops[7]);
    };
    assert_eq!(*low, 1);
    assert_eq!(offsets, &vec![1, 1, 2]);
    assert_eq!(*default, 4);
    assert_eq!(ops[8], Op::Inc { slot: 1, delta: 1 });
    assert_eq!(ops[9], Op::Inc { slot: 2, delta: 1 });
    assert_eq!(target(&ops, 10), 12);
    assert_eq!(ops[11], Op::Inc { slot: 3, delta: 1 });
    assert_eq!(ops[12], Op::Return);
}

#[test]
fn switch_without_default_falls_back_to_the_end() {
    let ops = ops(fall_through_switch(false));
    let Op::TableSwitch { default, .. } = &ops[7] else {
        panic!("expected tableswitch");
    };
    assert_eq!(7 + *default as usize, ops.len() - 1);
}

#[test]
fn switch_without_cases_discards_the_discriminant() {
    let ops = ops(vec![
        int_local("a", 0),
        Stmt::switch(
            Expr::var("a"),
            vec![SwitchGroup::new(
                vec![CaseLabel::Default],
                vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "a"))],
            )],
        ),
    ]);
    assert_eq!(
        &ops[2..],
        &[
            Op::Load(INT, 1),
            Op::LookupSwitch {
                default: 1,
                pairs: Vec::new(),
            },
            Op::Inc { slot: 1, delta: 1 },
            Op::Return,
        ]
    );
}

#[test]
fn sparse_switch_uses_lookup_dispatch() {
    let body = vec![
        int_local("a", 0),
        Stmt::switch(
            Expr::var("a"),
            vec![
                SwitchGroup::new(vec![CaseLabel::case(100)], vec![Stmt::break_stmt()]),
                SwitchGroup::new(vec![CaseLabel::case(-7)], vec![Stmt::break_stmt()]),
            ],
        ),
    ];
    let ops = ops(body.clone());
    assert!(matches!(&ops[3], Op::LookupSwitch { pairs, .. } if pairs.len() == 2 && pairs[0].0 == -7));

    let mut options = CompileOptions::default();
    options.switch.min_table_density = 0.0;
    let unit = Compiler::new(options).compile(&Unit::new("T", body)).expect("compile");
    assert!(matches!(&unit.ops[3], Op::TableSwitch { .. }));
}

#[test]
fn semantic_errors_stop_codegen() {
    let unit = Unit::new("Bad", vec![Stmt::expr(inc_dec(IncDecOp::PostInc, "missing"))]);
    let err = Compiler::default().compile(&unit).expect_err("must fail");
    let errors = err.downcast_ref::<SemanticErrors>().expect("semantic errors");
    assert_eq!(errors.total(), 1);
}

#[test]
fn lowering_an_error_node_fails_instead_of_panicking() {
    let unit = TypedUnit {
        name: "Broken".to_string(),
        fields: Vec::new(),
        returns: None,
        max_locals: 1,
        body: vec![TypedStmt::new(3, TypedStmtKind::Expr(TypedExpr::error(3)))],
    };
    let err = Compiler::default().lower(&unit).expect_err("error node");
    assert!(err.to_string().contains("failed checking"));
}

#[test]
fn listing_shows_absolute_targets() {
    let code = compile(Unit::new("Sw", fall_through_switch(true)));
    let listing = code.to_string();
    assert!(listing.starts_with("unit Sw (max_stack=1, max_locals=4)"));
    assert!(listing.contains("   7: tableswitch { 1: 8, 2: 8, 3: 9, default: 11 }"));
    assert!(listing.contains("  10: goto 12"));
}

#[test]
fn max_stack_accounts_for_duplicates() {
    let code = compile(
        Unit::new(
            "Deep",
            vec![Stmt::local("y", Type::Int, Some(inc_dec(IncDecOp::PostInc, "f")))],
        )
        .with_field("f", Type::Int),
    );
    assert_eq!(code.max_stack, 4);
    assert_eq!(code.max_locals, 2);
}
