use super::TypeChecker;
use crate::ast::{BinOp, Expr, ExprKind, IncDecOp, UnaryOp};
use crate::typ::typed::{Place, TypedExpr, TypedExprKind};
use crate::typ::{ErrorKind, NumericKind, Type};

impl TypeChecker {
    pub(super) fn check_expr(&mut self, expr: &Expr) -> TypedExpr {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Literal(lit) => TypedExpr::new(line, lit.ty(), TypedExprKind::Literal(*lit)),
            ExprKind::Var(_) | ExprKind::Field(_) => match self.resolve(expr) {
                Some(place) => TypedExpr::new(line, place.ty(), TypedExprKind::Load(place)),
                None => TypedExpr::error(line),
            },
            ExprKind::Unary { op, operand } => {
                let operand = self.check_expr(operand);
                match op {
                    UnaryOp::Negate => self.check_negate(line, operand),
                    UnaryOp::Not => self.check_not(line, operand),
                }
            }
            ExprKind::IncDec { op, operand } => self.check_inc_dec(line, *op, operand),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.check_expr(lhs);
                let rhs = self.check_expr(rhs);
                self.check_binary(line, *op, lhs, rhs)
            }
            ExprKind::Assign { target, value } => {
                let place = self.check_place(target, "Assignment target");
                let value = self.check_expr(value);
                let Some(place) = place else {
                    return TypedExpr::error(line);
                };
                if !value.ty.must_match_expected(line, place.ty(), &mut self.diagnostics) {
                    return TypedExpr::error(line);
                }
                TypedExpr::new(
                    line,
                    place.ty(),
                    TypedExprKind::Assign {
                        place,
                        value: Box::new(value),
                    },
                )
            }
        }
    }

    fn check_negate(&mut self, line: u32, operand: TypedExpr) -> TypedExpr {
        if operand.ty.is_any() {
            return TypedExpr::error(line);
        }
        match NumericKind::classify(operand.ty) {
            Some(kind) => TypedExpr::new(line, kind.to_type(), TypedExprKind::Negate(Box::new(operand))),
            None => {
                self.error(
                    line,
                    ErrorKind::OperandType,
                    format!("Invalid operand type for -: {}", operand.ty),
                );
                TypedExpr::error(line)
            }
        }
    }

    fn check_not(&mut self, line: u32, operand: TypedExpr) -> TypedExpr {
        match operand.ty {
            Type::Boolean => TypedExpr::new(line, Type::Boolean, TypedExprKind::Not(Box::new(operand))),
            Type::Any => TypedExpr::error(line),
            other => {
                self.error(line, ErrorKind::OperandType, format!("Invalid operand type for !: {}", other));
                TypedExpr::error(line)
            }
        }
    }

    fn check_inc_dec(&mut self, line: u32, op: IncDecOp, operand: &Expr) -> TypedExpr {
        let what = format!("Operand to {}", op.symbol());
        let Some(place) = self.check_place(operand, &what) else {
            return TypedExpr::error(line);
        };
        let ty = place.ty();
        if ty.is_any() {
            return TypedExpr::error(line);
        }
        match NumericKind::classify(ty) {
            Some(_) => TypedExpr::new(line, ty, TypedExprKind::IncDec { op, place }),
            None => {
                self.error(
                    line,
                    ErrorKind::OperandType,
                    format!("Invalid operand type for {}: {}", op.symbol(), ty),
                );
                TypedExpr::error(line)
            }
        }
    }

    fn check_binary(&mut self, line: u32, op: BinOp, lhs: TypedExpr, rhs: TypedExpr) -> TypedExpr {
        if lhs.ty.is_any() || rhs.ty.is_any() {
            return TypedExpr::error(line);
        }
        let same_numeric = lhs.ty == rhs.ty && lhs.ty.is_numeric();
        let result = if op.is_arith() {
            same_numeric.then_some(lhs.ty)
        } else if op.is_ordering() {
            same_numeric.then_some(Type::Boolean)
        } else if op.is_equality() {
            (lhs.ty == rhs.ty).then_some(Type::Boolean)
        } else {
            (lhs.ty == Type::Boolean && rhs.ty == Type::Boolean).then_some(Type::Boolean)
        };
        match result {
            Some(ty) => TypedExpr::new(
                line,
                ty,
                TypedExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            ),
            None => {
                self.error(
                    line,
                    ErrorKind::OperandType,
                    format!("Invalid operand types for {}: {} and {}", op.symbol(), lhs.ty, rhs.ty),
                );
                TypedExpr::error(line)
            }
        }
    }

    /// Resolves an assignable operand to its place; `what` names it in the error.
    fn check_place(&mut self, expr: &Expr, what: &str) -> Option<Place> {
        if expr.is_lhs() {
            return self.resolve(expr);
        }
        // still surface errors inside the operand
        self.check_expr(expr);
        self.error(
            expr.line,
            ErrorKind::NotAssignable,
            format!("{} must have an LValue", what),
        );
        None
    }

    fn resolve(&mut self, expr: &Expr) -> Option<Place> {
        let place = match &expr.kind {
            ExprKind::Var(name) => self.context.lookup(name),
            ExprKind::Field(name) => self.context.lookup_field(name).map(Place::Field),
            _ => None,
        };
        if place.is_none() {
            let message = match &expr.kind {
                ExprKind::Field(name) => format!("Cannot find field {}", name),
                _ => format!("Cannot find name {}", expr),
            };
            self.error(expr.line, ErrorKind::UndefinedName, message);
        }
        place
    }
}
