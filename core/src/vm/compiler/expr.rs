use anyhow::{Result, bail};

use super::Location;
use super::builder::{CodeGen, Usage};
use crate::ast::{BinOp, IncDecOp, Literal};
use crate::typ::typed::{Place, TypedExpr, TypedExprKind};
use crate::typ::NumericKind;
use crate::vm::{Branch, Cond, Label, Op};

impl CodeGen<'_> {
    /// Lowers `expr`; with [`Usage::Discard`] the stack is left as it was.
    pub fn expr(&mut self, expr: &TypedExpr, usage: Usage) -> Result<()> {
        match &expr.kind {
            TypedExprKind::IncDec { op, place } => self.inc_dec(*op, place, usage),
            TypedExprKind::Assign { place, value } => self.assign(place, value, usage),
            _ => {
                self.value(expr)?;
                if !usage.needs_value() {
                    self.emit(Op::Pop);
                }
                Ok(())
            }
        }
    }

    /// Lowers `expr` leaving exactly one value on the stack.
    pub fn value(&mut self, expr: &TypedExpr) -> Result<()> {
        match &expr.kind {
            TypedExprKind::Literal(lit) => {
                let op = match *lit {
                    Literal::Int(v) => Op::IConst(v),
                    Literal::Long(v) => Op::LConst(v),
                    Literal::Double(v) => Op::DConst(v),
                    Literal::Bool(v) => Op::IConst(v as i32),
                };
                self.emit(op);
            }
            TypedExprKind::Load(Place::Local(local)) => local.emit_load(&mut *self.out),
            TypedExprKind::Load(Place::Field(field)) => {
                // plain read: the receiver is consumed, not held for a store
                field.emit_address(&mut *self.out);
                self.emit(Op::GetField(field.index));
            }
            TypedExprKind::Negate(operand) => {
                let kind = numeric_kind(expr)?;
                self.value(operand)?;
                self.emit(Op::Neg(kind));
            }
            TypedExprKind::Binary { op, lhs, rhs } if op.is_arith() => {
                let kind = numeric_kind(expr)?;
                self.value(lhs)?;
                self.value(rhs)?;
                self.emit(arith_op(*op, kind));
            }
            TypedExprKind::Not(_) | TypedExprKind::Binary { .. } => self.materialize(expr)?,
            TypedExprKind::IncDec { op, place } => self.inc_dec(*op, place, Usage::Value)?,
            TypedExprKind::Assign { place, value } => self.assign(place, value, Usage::Value)?,
            TypedExprKind::Error => bail!("cannot lower an expression that failed checking (line {})", expr.line),
        }
        Ok(())
    }

    /// Produces a boolean value through the branch form:
    /// `branch false -> F; push 1; goto E; F: push 0; E:`.
    fn materialize(&mut self, expr: &TypedExpr) -> Result<()> {
        let on_false = self.label();
        let end = self.label();
        self.branch(expr, on_false, false)?;
        self.emit(Op::IConst(1));
        self.goto(end);
        self.bind(on_false);
        self.emit(Op::IConst(0));
        self.bind(end);
        Ok(())
    }

    /// Jumps to `target` when `expr` evaluates to `on_true`, falls through otherwise.
    /// Never leaves a value on the stack.
    pub fn branch(&mut self, expr: &TypedExpr, target: Label, on_true: bool) -> Result<()> {
        match &expr.kind {
            TypedExprKind::Literal(Literal::Bool(value)) => {
                if *value == on_true {
                    self.goto(target);
                }
            }
            TypedExprKind::Not(operand) => self.branch(operand, target, !on_true)?,
            TypedExprKind::Binary {
                op: BinOp::And,
                lhs,
                rhs,
            } => {
                if on_true {
                    let skip = self.label();
                    self.branch(lhs, skip, false)?;
                    self.branch(rhs, target, true)?;
                    self.bind(skip);
                } else {
                    self.branch(lhs, target, false)?;
                    self.branch(rhs, target, false)?;
                }
            }
            TypedExprKind::Binary {
                op: BinOp::Or,
                lhs,
                rhs,
            } => {
                if on_true {
                    self.branch(lhs, target, true)?;
                    self.branch(rhs, target, true)?;
                } else {
                    let skip = self.label();
                    self.branch(lhs, skip, true)?;
                    self.branch(rhs, target, false)?;
                    self.bind(skip);
                }
            }
            TypedExprKind::Binary { op, lhs, rhs } if op.is_comparison() => {
                self.compare(*op, lhs, rhs, target, on_true)?;
            }
            _ => {
                self.value(expr)?;
                let cond = if on_true { Cond::Ne } else { Cond::Eq };
                self.out.add_branch(Branch::If(cond), target);
            }
        }
        Ok(())
    }

    fn compare(&mut self, op: BinOp, lhs: &TypedExpr, rhs: &TypedExpr, target: Label, on_true: bool) -> Result<()> {
        let cond = comparison_cond(op)?;
        let cond = if on_true { cond } else { cond.negate() };
        self.value(lhs)?;
        self.value(rhs)?;
        match lhs.ty.storage_kind() {
            NumericKind::Int => self.out.add_branch(Branch::IfICmp(cond), target),
            NumericKind::Long => {
                self.emit(Op::LCmp);
                self.out.add_branch(Branch::If(cond), target);
            }
            NumericKind::Double => {
                // pick the NaN result that makes the original comparison false
                let cmp = if matches!(op, BinOp::Lt | BinOp::Le) { Op::DCmpG } else { Op::DCmpL };
                self.emit(cmp);
                self.out.add_branch(Branch::If(cond), target);
            }
        }
        Ok(())
    }

    /// `++`/`--` through the location protocol.
    ///
    /// Locals use the in-place `Inc`; the value, when wanted, is loaded before
    /// the increment for postfix and after it for prefix. Other locations run
    /// address, load, add or sub of one, store, with one duplicate placed before
    /// or after the arithmetic, and no duplicate at all when the value is discarded.
    fn inc_dec(&mut self, op: IncDecOp, place: &Place, usage: Usage) -> Result<()> {
        let ty = place.ty();
        let Some(kind) = NumericKind::classify(ty) else {
            bail!("{} on non-numeric type {}", op.symbol(), ty);
        };
        let wanted = usage.needs_value();
        match place {
            Place::Local(local) => {
                if wanted && !op.is_prefix() {
                    self.emit(Op::Load(kind, local.slot));
                }
                self.out.add_inc(local.slot, op.delta());
                if wanted && op.is_prefix() {
                    self.emit(Op::Load(kind, local.slot));
                }
            }
            Place::Field(_) => {
                let location = place.location();
                location.emit_address(&mut *self.out);
                location.emit_load(&mut *self.out);
                if wanted && !op.is_prefix() {
                    location.emit_duplicate(&mut *self.out);
                }
                self.emit(unit_const(kind));
                self.emit(if op.is_increment() { Op::Add(kind) } else { Op::Sub(kind) });
                if wanted && op.is_prefix() {
                    location.emit_duplicate(&mut *self.out);
                }
                location.emit_store(&mut *self.out);
            }
        }
        Ok(())
    }

    fn assign(&mut self, place: &Place, value: &TypedExpr, usage: Usage) -> Result<()> {
        let location = place.location();
        location.emit_address(&mut *self.out);
        self.value(value)?;
        if usage.needs_value() {
            location.emit_duplicate(&mut *self.out);
        }
        location.emit_store(&mut *self.out);
        Ok(())
    }
}

fn numeric_kind(expr: &TypedExpr) -> Result<NumericKind> {
    match NumericKind::classify(expr.ty) {
        Some(kind) => Ok(kind),
        None => bail!("expected a numeric expression at line {}, found {}", expr.line, expr.ty),
    }
}

fn arith_op(op: BinOp, kind: NumericKind) -> Op {
    match op {
        BinOp::Sub => Op::Sub(kind),
        BinOp::Mul => Op::Mul(kind),
        BinOp::Div => Op::Div(kind),
        BinOp::Rem => Op::Rem(kind),
        _ => Op::Add(kind),
    }
}

fn comparison_cond(op: BinOp) -> Result<Cond> {
    Ok(match op {
        BinOp::Lt => Cond::Lt,
        BinOp::Le => Cond::Le,
        BinOp::Gt => Cond::Gt,
        BinOp::Ge => Cond::Ge,
        BinOp::Eq => Cond::Eq,
        BinOp::Ne => Cond::Ne,
        other => bail!("{} is not a comparison", other),
    })
}

/// The typed constant one.
fn unit_const(kind: NumericKind) -> Op {
    match kind {
        NumericKind::Int => Op::IConst(1),
        NumericKind::Long => Op::LConst(1),
        NumericKind::Double => Op::DConst(1.0),
    }
}
