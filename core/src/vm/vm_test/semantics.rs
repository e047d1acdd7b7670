use super::*;

fn observe(body: Vec<Stmt>) -> Outcome {
    let unit = Unit::new("Probe", body)
        .with_field("x", Type::Int)
        .with_field("y", Type::Int)
        .with_field("l", Type::Long)
        .with_field("d", Type::Double);
    run(&unit)
}

#[test]
fn bare_post_increment_leaves_nothing_behind() {
    let outcome = observe(vec![int_local("a", 5), bump("a")]);
    assert_eq!(outcome.local(1), Some(Value::Int(6)));
    assert_eq!(outcome.stack_left, 0);
    assert_eq!(outcome.max_depth, 1);
}

#[test]
fn post_increment_yields_the_old_value() {
    // int a = 5; y = a++; x = a;
    let outcome = observe(vec![
        int_local("a", 5),
        set("y", Expr::inc_dec(IncDecOp::PostInc, Expr::var("a"))),
        set("x", Expr::var("a")),
    ]);
    assert_eq!(field_int(&outcome, "y"), 5);
    assert_eq!(field_int(&outcome, "x"), 6);
}

#[test]
fn pre_increment_yields_the_new_value() {
    let outcome = observe(vec![
        int_local("a", 5),
        set("y", Expr::inc_dec(IncDecOp::PreInc, Expr::var("a"))),
    ]);
    assert_eq!(field_int(&outcome, "y"), 6);
    assert_eq!(outcome.local(1), Some(Value::Int(6)));
}

#[test]
fn field_pre_and_post_decrement_surface_the_right_value() {
    // x = 10; y = --x;
    let outcome = observe(vec![
        set("x", Expr::int(10)),
        set("y", Expr::inc_dec(IncDecOp::PreDec, Expr::var("x"))),
    ]);
    assert_eq!(field_int(&outcome, "x"), 9);
    assert_eq!(field_int(&outcome, "y"), 9);

    // x = 10; y = x--;
    let outcome = observe(vec![
        set("x", Expr::int(10)),
        set("y", Expr::inc_dec(IncDecOp::PostDec, Expr::field("x"))),
    ]);
    assert_eq!(field_int(&outcome, "x"), 9);
    assert_eq!(field_int(&outcome, "y"), 10);
    assert_eq!(outcome.stack_left, 0);
}

#[test]
fn long_and_double_locations_keep_their_kind() {
    let outcome = observe(vec![
        Stmt::expr(Expr::inc_dec(IncDecOp::PreInc, Expr::var("l"))),
        Stmt::expr(Expr::inc_dec(IncDecOp::PostDec, Expr::var("d"))),
        Stmt::local("m", Type::Long, Some(Expr::long(i64::MAX))),
        bump("m"),
    ]);
    assert_eq!(outcome.field("l"), Some(Value::Long(1)));
    assert_eq!(outcome.field("d"), Some(Value::Double(-1.0)));
    assert_eq!(outcome.local(1), Some(Value::Long(i64::MIN)));
}

#[test]
fn negation_per_kind() {
    let outcome = observe(vec![
        set("x", Expr::neg(Expr::int(i32::MIN))),
        set("l", Expr::neg(Expr::long(7))),
        set("d", Expr::neg(Expr::double(2.5))),
    ]);
    assert_eq!(field_int(&outcome, "x"), i32::MIN);
    assert_eq!(outcome.field("l"), Some(Value::Long(-7)));
    assert_eq!(outcome.field("d"), Some(Value::Double(-2.5)));
}

#[test]
fn logical_not_materializes_zero_or_one() {
    let outcome = observe(vec![
        int_local("a", 1),
        Stmt::local(
            "t",
            Type::Boolean,
            Some(Expr::not(bin(BinOp::Gt, Expr::var("a"), Expr::int(3)))),
        ),
        Stmt::local("f", Type::Boolean, Some(Expr::not(Expr::var("t")))),
    ]);
    assert_eq!(outcome.local(2), Some(Value::Int(1)));
    assert_eq!(outcome.local(3), Some(Value::Int(0)));
}

#[test]
fn and_short_circuits_its_right_side() {
    // if (x > 0 && y++ > 0) {} -- x is 0, so y must stay 0
    let outcome = observe(vec![Stmt::if_else(
        bin(
            BinOp::And,
            bin(BinOp::Gt, Expr::var("x"), Expr::int(0)),
            bin(
                BinOp::Gt,
                Expr::inc_dec(IncDecOp::PostInc, Expr::var("y")),
                Expr::int(0),
            ),
        ),
        Stmt::block(vec![]),
        None,
    )]);
    assert_eq!(field_int(&outcome, "y"), 0);
}

#[test]
fn or_short_circuits_its_right_side() {
    // if (x == 0 || y++ > 0) x = 7;
    let outcome = observe(vec![Stmt::if_else(
        bin(
            BinOp::Or,
            bin(BinOp::Eq, Expr::var("x"), Expr::int(0)),
            bin(
                BinOp::Gt,
                Expr::inc_dec(IncDecOp::PostInc, Expr::var("y")),
                Expr::int(0),
            ),
        ),
        set("x", Expr::int(7)),
        None,
    )]);
    assert_eq!(field_int(&outcome, "x"), 7);
    assert_eq!(field_int(&outcome, "y"), 0);
}

#[test]
fn long_and_double_comparisons_branch_correctly() {
    let outcome = observe(vec![
        Stmt::if_else(
            bin(BinOp::Lt, Expr::long(-3), Expr::var("l")),
            set("x", Expr::int(1)),
            Some(set("x", Expr::int(2))),
        ),
        Stmt::if_else(
            bin(BinOp::Ge, Expr::var("d"), Expr::double(0.5)),
            set("y", Expr::int(1)),
            Some(set("y", Expr::int(2))),
        ),
    ]);
    assert_eq!(field_int(&outcome, "x"), 1);
    assert_eq!(field_int(&outcome, "y"), 2);
}

#[test]
fn nan_compares_false_both_ways() {
    // d = 0.0 / 0.0; x = d < 1.0; y = d > 1.0
    let nan = bin(BinOp::Div, Expr::double(0.0), Expr::double(0.0));
    let outcome = observe(vec![
        set("d", nan),
        Stmt::if_else(
            bin(BinOp::Lt, Expr::var("d"), Expr::double(1.0)),
            set("x", Expr::int(1)),
            None,
        ),
        Stmt::if_else(
            bin(BinOp::Gt, Expr::var("d"), Expr::double(1.0)),
            set("y", Expr::int(1)),
            None,
        ),
    ]);
    assert_eq!(field_int(&outcome, "x"), 0);
    assert_eq!(field_int(&outcome, "y"), 0);
}

#[test]
fn return_value_is_reported() {
    let unit = Unit::new(
        "Ret",
        vec![
            int_local("a", 20),
            Stmt::return_stmt(Some(bin(BinOp::Mul, Expr::var("a"), Expr::int(2)))),
        ],
    )
    .returning(Type::Int);
    assert_eq!(run(&unit).value, Some(Value::Int(40)));
}

#[test]
fn boolean_return_is_materialized() {
    let unit = Unit::new(
        "RetBool",
        vec![Stmt::return_stmt(Some(Expr::not(Expr::bool(false))))],
    )
    .returning(Type::Boolean);
    assert_eq!(run(&unit).value, Some(Value::Int(1)));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let unit = Unit::new(
        "Div",
        vec![
            int_local("a", 0),
            Stmt::local("b", Type::Int, Some(bin(BinOp::Div, Expr::int(1), Expr::var("a")))),
        ],
    );
    let err = Vm::default().run(&compile(&unit)).expect_err("div by zero");
    assert!(err.to_string().contains("division by zero"));
}

#[test]
fn reading_an_uninitialized_local_is_a_runtime_error() {
    let unit = Unit::new("Uninit", vec![Stmt::local("a", Type::Int, None), bump("a")]);
    let err = Vm::default().run(&compile(&unit)).expect_err("uninitialized");
    assert!(err.to_string().contains("uninitialized local 1"));
}

#[test]
fn outcome_serializes_for_tooling() {
    let outcome = observe(vec![set("x", Expr::int(3))]);
    let json = serde_json::to_value(&outcome).expect("json");
    assert_eq!(json["fields"][0], serde_json::json!(["x", {"int": 3}]));
    assert_eq!(json["value"], serde_json::Value::Null);
}
