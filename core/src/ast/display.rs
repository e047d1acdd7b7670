use super::{BinOp, CaseLabel, Expr, ExprKind, IncDecOp, Literal, Stmt, StmtKind, UnaryOp, Unit};
use std::fmt::{self, Display};

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Long(v) => write!(f, "{}L", v),
            Literal::Double(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{:.1}", v)
                } else {
                    write!(f, "{}", v)
                }
            }
            Literal::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(lit) => write!(f, "{}", lit),
            ExprKind::Var(name) => f.write_str(name),
            ExprKind::Field(name) => write!(f, "this.{}", name),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Negate => write!(f, "-{}", operand),
                UnaryOp::Not => write!(f, "!{}", operand),
            },
            ExprKind::IncDec { op, operand } => match op {
                IncDecOp::PreInc | IncDecOp::PreDec => write!(f, "{}{}", op.symbol(), operand),
                IncDecOp::PostInc | IncDecOp::PostDec => write!(f, "{}{}", operand, op.symbol()),
            },
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            ExprKind::Assign { target, value } => write!(f, "{} = {}", target, value),
        }
    }
}

fn join_stmts(stmts: &[Stmt]) -> String {
    stmts
        .iter()
        .map(|s| {
            let text = s.to_string();
            text.strip_suffix(';').map(str::to_string).unwrap_or(text)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Block(statements) => {
                write!(f, "{{")?;
                for stmt in statements {
                    write!(f, " {}", stmt)?;
                }
                write!(f, " }}")
            }
            StmtKind::Local { name, ty, init } => match init {
                Some(init) => write!(f, "{} {} = {};", ty, name, init),
                None => write!(f, "{} {};", ty, name),
            },
            StmtKind::Expr(expr) => write!(f, "{};", expr),
            StmtKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                if let Some(else_stmt) = else_stmt {
                    write!(f, "if ({}) {} else {}", condition, then_stmt, else_stmt)
                } else {
                    write!(f, "if ({}) {}", condition, then_stmt)
                }
            }
            StmtKind::While { condition, body } => write!(f, "while ({}) {}", condition, body),
            StmtKind::Do { body, condition } => write!(f, "do {} while ({});", body, condition),
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                write!(f, "for ({};", join_stmts(init))?;
                if let Some(condition) = condition {
                    write!(f, " {}", condition)?;
                }
                write!(f, ";")?;
                if !update.is_empty() {
                    write!(f, " {}", join_stmts(update))?;
                }
                match body {
                    Some(body) => write!(f, ") {}", body),
                    None => write!(f, ");"),
                }
            }
            StmtKind::Switch { discriminant, groups } => {
                write!(f, "switch ({}) {{", discriminant)?;
                for group in groups {
                    for label in &group.labels {
                        match label {
                            CaseLabel::Case(value) => write!(f, " case {}:", value)?,
                            CaseLabel::Default => write!(f, " default:")?,
                        }
                    }
                    for stmt in &group.block {
                        write!(f, " {}", stmt)?;
                    }
                }
                write!(f, " }}")
            }
            StmtKind::Break => write!(f, "break;"),
            StmtKind::Continue => write!(f, "continue;"),
            StmtKind::Return { value } => match value {
                Some(value) => write!(f, "return {};", value),
                None => write!(f, "return;"),
            },
            StmtKind::Empty => write!(f, ";"),
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "unit {} {{", self.name)?;
        for field in &self.fields {
            writeln!(f, "    {} {};", field.ty, field.name)?;
        }
        for stmt in &self.body {
            writeln!(f, "    {}", stmt)?;
        }
        write!(f, "}}")
    }
}
