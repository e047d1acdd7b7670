pub(super) use crate::{
    ast::{BinOp, CaseLabel, Expr, IncDecOp, Stmt, SwitchGroup, Unit},
    typ::Type,
    vm::{CodeUnit, Compiler, Outcome, Value, Vm},
};

pub(super) fn compile(unit: &Unit) -> CodeUnit {
    Compiler::default().compile(unit).expect("compile")
}

pub(super) fn run(unit: &Unit) -> Outcome {
    Vm::default().run(&compile(unit)).expect("run")
}

pub(super) fn int_local(name: &str, value: i32) -> Stmt {
    Stmt::local(name, Type::Int, Some(Expr::int(value)))
}

pub(super) fn set(name: &str, value: Expr) -> Stmt {
    Stmt::expr(Expr::assign(Expr::var(name), value))
}

pub(super) fn bump(name: &str) -> Stmt {
    Stmt::expr(Expr::inc_dec(IncDecOp::PostInc, Expr::var(name)))
}

pub(super) fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(op, lhs, rhs)
}

pub(super) fn field_int(outcome: &Outcome, name: &str) -> i32 {
    match outcome.field(name) {
        Some(Value::Int(v)) => v,
        other => panic!("field {} is {:?}", name, other),
    }
}

mod control_flow;
mod semantics;
