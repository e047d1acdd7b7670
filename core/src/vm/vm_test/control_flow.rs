use super::*;

fn counter_unit(name: &str, body: Vec<Stmt>) -> Unit {
    Unit::new(name, body)
        .with_field("count", Type::Int)
        .with_field("other", Type::Int)
}

#[test]
fn for_loop_runs_its_body_three_times() {
    // for (int i = 0; i < 3; i = i + 1) count++;
    let unit = counter_unit(
        "For",
        vec![Stmt::for_loop(
            vec![int_local("i", 0)],
            Some(bin(BinOp::Lt, Expr::var("i"), Expr::int(3))),
            vec![set("i", bin(BinOp::Add, Expr::var("i"), Expr::int(1)))],
            Some(bump("count")),
        )],
    );
    let outcome = run(&unit);
    assert_eq!(field_int(&outcome, "count"), 3);
    assert_eq!(outcome.stack_left, 0);
}

#[test]
fn for_loop_with_false_condition_never_runs_the_body() {
    let unit = counter_unit(
        "Never",
        vec![Stmt::for_loop(vec![], Some(Expr::bool(false)), vec![], Some(bump("count")))],
    );
    assert_eq!(field_int(&run(&unit), "count"), 0);
}

#[test]
fn do_while_false_runs_once() {
    let unit = counter_unit("Once", vec![Stmt::do_while(bump("count"), Expr::bool(false))]);
    assert_eq!(field_int(&run(&unit), "count"), 1);
}

#[test]
fn continue_in_for_still_runs_the_update() {
    // for (int i = 0; i < 6; i++) { count++; if (i % 2 == 0) continue; other++; }
    let unit = counter_unit(
        "Skip",
        vec![Stmt::for_loop(
            vec![int_local("i", 0)],
            Some(bin(BinOp::Lt, Expr::var("i"), Expr::int(6))),
            vec![bump("i")],
            Some(Stmt::block(vec![
                bump("count"),
                Stmt::if_else(
                    bin(
                        BinOp::Eq,
                        bin(BinOp::Rem, Expr::var("i"), Expr::int(2)),
                        Expr::int(0),
                    ),
                    Stmt::continue_stmt(),
                    None,
                ),
                bump("other"),
            ])),
        )],
    );
    let outcome = Vm::new(10_000).run(&compile(&unit)).expect("terminates");
    assert_eq!(field_int(&outcome, "count"), 6);
    assert_eq!(field_int(&outcome, "other"), 3);
}

#[test]
fn continue_in_do_while_retests_the_condition() {
    // do { count++; continue; } while (false);
    let unit = counter_unit(
        "DoContinue",
        vec![Stmt::do_while(
            Stmt::block(vec![bump("count"), Stmt::continue_stmt(), bump("other")]),
            Expr::bool(false),
        )],
    );
    let outcome = Vm::new(1_000).run(&compile(&unit)).expect("terminates");
    assert_eq!(field_int(&outcome, "count"), 1);
    assert_eq!(field_int(&outcome, "other"), 0);
}

#[test]
fn empty_for_runs_until_break() {
    // for (;;) { count++; if (count == 4) break; }
    let unit = counter_unit(
        "Forever",
        vec![Stmt::for_loop(
            vec![],
            None,
            vec![],
            Some(Stmt::block(vec![
                bump("count"),
                Stmt::if_else(
                    bin(BinOp::Eq, Expr::var("count"), Expr::int(4)),
                    Stmt::break_stmt(),
                    None,
                ),
            ])),
        )],
    );
    assert_eq!(field_int(&run(&unit), "count"), 4);
}

fn grouped_switch(discriminant: i32, break_in_first: bool) -> Unit {
    // switch (k) { case 1: case 2: A [break;] case 3: B; default: C }
    let mut first = vec![set("count", bin(BinOp::Add, Expr::var("count"), Expr::int(1)))];
    if break_in_first {
        first.push(Stmt::break_stmt());
    }
    Unit::new(
        "Switch",
        vec![
            int_local("k", discriminant),
            Stmt::switch(
                Expr::var("k"),
                vec![
                    SwitchGroup::new(vec![CaseLabel::case(1), CaseLabel::case(2)], first),
                    SwitchGroup::new(vec![CaseLabel::case(3)], vec![bump("b")]),
                    SwitchGroup::new(vec![CaseLabel::Default], vec![bump("c")]),
                ],
            ),
        ],
    )
    .with_field("count", Type::Int)
    .with_field("b", Type::Int)
    .with_field("c", Type::Int)
}

#[test]
fn switch_falls_through_into_later_groups() {
    let outcome = run(&grouped_switch(2, false));
    assert_eq!(
        [
            field_int(&outcome, "count"),
            field_int(&outcome, "b"),
            field_int(&outcome, "c")
        ],
        [1, 1, 1]
    );
}

#[test]
fn break_stops_fall_through() {
    let outcome = run(&grouped_switch(2, true));
    assert_eq!(
        [
            field_int(&outcome, "count"),
            field_int(&outcome, "b"),
            field_int(&outcome, "c")
        ],
        [1, 0, 0]
    );
}

#[test]
fn unmatched_keys_go_to_default() {
    for key in [0, 4, -1] {
        let outcome = run(&grouped_switch(key, true));
        assert_eq!(field_int(&outcome, "count"), 0, "key {}", key);
        assert_eq!(field_int(&outcome, "b"), 0, "key {}", key);
        assert_eq!(field_int(&outcome, "c"), 1, "key {}", key);
    }
}

#[test]
fn switch_without_default_skips_everything_on_a_miss() {
    let unit = Unit::new(
        "NoDefault",
        vec![
            int_local("k", 9),
            Stmt::switch(
                Expr::var("k"),
                vec![SwitchGroup::new(vec![CaseLabel::case(9 - 1)], vec![bump("c")])],
            ),
        ],
    )
    .with_field("c", Type::Int);
    let outcome = run(&unit);
    assert_eq!(field_int(&outcome, "c"), 0);
    assert_eq!(outcome.stack_left, 0);
}

#[test]
fn sparse_and_negative_cases_dispatch_correctly() {
    for (key, expected) in [(-1000, 1), (5, 2), (1_000_000, 3), (6, 0)] {
        let unit = Unit::new(
            "Sparse",
            vec![
                int_local("k", key),
                Stmt::switch(
                    Expr::var("k"),
                    vec![
                        SwitchGroup::new(
                            vec![CaseLabel::Case(Expr::neg(Expr::int(1000)))],
                            vec![set("c", Expr::int(1)), Stmt::break_stmt()],
                        ),
                        SwitchGroup::new(vec![CaseLabel::case(5)], vec![set("c", Expr::int(2)), Stmt::break_stmt()]),
                        SwitchGroup::new(vec![CaseLabel::case(1_000_000)], vec![set("c", Expr::int(3))]),
                    ],
                ),
            ],
        )
        .with_field("c", Type::Int);
        assert_eq!(field_int(&run(&unit), "c"), expected, "key {}", key);
    }
}

#[test]
fn continue_inside_switch_continues_the_loop() {
    // while (i < 4) { i++; switch (i) { case 2: continue; default: count++; } other++; }
    let unit = counter_unit(
        "LoopSwitch",
        vec![
            int_local("i", 0),
            Stmt::while_loop(
                bin(BinOp::Lt, Expr::var("i"), Expr::int(4)),
                Stmt::block(vec![
                    bump("i"),
                    Stmt::switch(
                        Expr::var("i"),
                        vec![
                            SwitchGroup::new(vec![CaseLabel::case(2)], vec![Stmt::continue_stmt()]),
                            SwitchGroup::new(vec![CaseLabel::Default], vec![bump("count")]),
                        ],
                    ),
                    bump("other"),
                ]),
            ),
        ],
    );
    let outcome = run(&unit);
    assert_eq!(field_int(&outcome, "count"), 3);
    assert_eq!(field_int(&outcome, "other"), 3);
    assert_eq!(outcome.local(1), Some(Value::Int(4)));
}

#[test]
fn while_not_loops_until_flag_is_set() {
    // boolean done = false; while (!done) { count++; if (count >= 3) done = true; }
    let unit = counter_unit(
        "Flag",
        vec![
            Stmt::local("done", Type::Boolean, Some(Expr::bool(false))),
            Stmt::while_loop(
                Expr::not(Expr::var("done")),
                Stmt::block(vec![
                    bump("count"),
                    Stmt::if_else(
                        bin(BinOp::Ge, Expr::var("count"), Expr::int(3)),
                        set("done", Expr::bool(true)),
                        None,
                    ),
                ]),
            ),
        ],
    );
    assert_eq!(field_int(&run(&unit), "count"), 3);
}

#[test]
fn nested_loops_break_only_the_inner_one() {
    // for (int i = 0; i < 3; i++) for (int j = 0; ; j++) { if (j == 2) break; count++; }
    let unit = counter_unit(
        "Nested",
        vec![Stmt::for_loop(
            vec![int_local("i", 0)],
            Some(bin(BinOp::Lt, Expr::var("i"), Expr::int(3))),
            vec![bump("i")],
            Some(Stmt::for_loop(
                vec![int_local("j", 0)],
                None,
                vec![bump("j")],
                Some(Stmt::block(vec![
                    Stmt::if_else(
                        bin(BinOp::Eq, Expr::var("j"), Expr::int(2)),
                        Stmt::break_stmt(),
                        None,
                    ),
                    bump("count"),
                ])),
            )),
        )],
    );
    assert_eq!(field_int(&run(&unit), "count"), 6);
}

#[test]
fn infinite_loop_exhausts_the_budget() {
    let unit = Unit::new("Spin", vec![Stmt::while_loop(Expr::bool(true), Stmt::new(crate::ast::StmtKind::Empty))]);
    let err = Vm::new(100).run(&compile(&unit)).expect_err("budget");
    assert!(err.to_string().contains("budget"));
}
