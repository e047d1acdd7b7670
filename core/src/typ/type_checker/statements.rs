use super::{FrameKind, LoopFrame, LoopScope, TypeChecker};
use crate::ast::{CaseLabel, Expr, ExprKind, Literal, Stmt, StmtKind, SwitchGroup, UnaryOp};
use crate::typ::typed::{SwitchLabel, TypedExpr, TypedGroup, TypedStmt, TypedStmtKind};
use crate::typ::{ErrorKind, Type};
use rustc_hash::FxHashSet;

impl TypeChecker {
    pub(super) fn check_block(&mut self, statements: &[Stmt], loops: LoopScope<'_>) -> Vec<TypedStmt> {
        statements.iter().map(|stmt| self.check_stmt(stmt, loops)).collect()
    }

    pub(super) fn check_stmt(&mut self, stmt: &Stmt, loops: LoopScope<'_>) -> TypedStmt {
        let line = stmt.line;
        let kind = match &stmt.kind {
            StmtKind::Block(statements) => {
                TypedStmtKind::Block(self.scoped(|this| this.check_block(statements, loops)))
            }
            StmtKind::Local { name, ty, init } => self.check_local(line, name, *ty, init.as_ref()),
            StmtKind::Expr(expr) => {
                if !matches!(expr.kind, ExprKind::Assign { .. } | ExprKind::IncDec { .. }) {
                    self.error(line, ErrorKind::NotAStatement, format!("{} is not a statement", expr));
                }
                TypedStmtKind::Expr(self.check_expr(expr))
            }
            StmtKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                let condition = self.check_condition(condition, "if");
                let then_stmt = self.scoped(|this| this.check_stmt(then_stmt, loops));
                let else_stmt = else_stmt
                    .as_ref()
                    .map(|else_stmt| Box::new(self.scoped(|this| this.check_stmt(else_stmt, loops))));
                TypedStmtKind::If {
                    condition,
                    then_stmt: Box::new(then_stmt),
                    else_stmt,
                }
            }
            StmtKind::While { condition, body } => {
                let condition = self.check_condition(condition, "while");
                let target = self.fresh_target();
                let frame = LoopFrame::new(FrameKind::Loop, target, loops);
                let body = self.scoped(|this| this.check_stmt(body, frame.scope()));
                TypedStmtKind::While {
                    target,
                    condition,
                    body: Box::new(body),
                }
            }
            StmtKind::Do { body, condition } => {
                let target = self.fresh_target();
                let frame = LoopFrame::new(FrameKind::Loop, target, loops);
                let body = self.scoped(|this| this.check_stmt(body, frame.scope()));
                let condition = self.check_condition(condition, "do");
                TypedStmtKind::Do {
                    target,
                    body: Box::new(body),
                    condition,
                }
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => self.scoped(|this| this.check_for(init, condition.as_ref(), update, body.as_deref(), loops)),
            StmtKind::Switch { discriminant, groups } => self.check_switch(line, discriminant, groups, loops),
            StmtKind::Break => {
                let target = loops.break_target();
                if target.is_none() {
                    self.error(line, ErrorKind::MisplacedBreak, "break outside switch or loop");
                }
                TypedStmtKind::Break { target }
            }
            StmtKind::Continue => {
                let target = loops.continue_target();
                if target.is_none() {
                    self.error(line, ErrorKind::MisplacedContinue, "continue outside of loop");
                }
                TypedStmtKind::Continue { target }
            }
            StmtKind::Return { value } => self.check_return(line, value.as_ref()),
            StmtKind::Empty => TypedStmtKind::Empty,
        };
        TypedStmt::new(line, kind)
    }

    fn check_local(&mut self, line: u32, name: &str, ty: Type, init: Option<&Expr>) -> TypedStmtKind {
        // the initializer cannot see the name it initializes
        let init = init.map(|init| {
            let typed = self.check_expr(init);
            typed.ty.must_match_expected(typed.line, ty, &mut self.diagnostics);
            typed
        });
        match self.context.declare(name, ty) {
            Some(slot) => TypedStmtKind::Local { slot, init },
            None => {
                self.error(line, ErrorKind::Redeclared, format!("Variable {} is already defined", name));
                TypedStmtKind::Empty
            }
        }
    }

    /// Checks a loop or `if` condition; anything but boolean is reported.
    fn check_condition(&mut self, condition: &Expr, construct: &str) -> TypedExpr {
        let typed = self.check_expr(condition);
        if !typed.ty.matches(Type::Boolean) {
            self.error(
                typed.line,
                ErrorKind::ConditionType,
                format!("Condition of {} statement must be boolean, found {}", construct, typed.ty),
            );
        }
        typed
    }

    fn check_for(
        &mut self,
        init: &[Stmt],
        condition: Option<&Expr>,
        update: &[Stmt],
        body: Option<&Stmt>,
        loops: LoopScope<'_>,
    ) -> TypedStmtKind {
        let init = self.check_block(init, loops);
        let condition = condition.map(|condition| self.check_condition(condition, "for"));
        let target = self.fresh_target();
        let frame = LoopFrame::new(FrameKind::Loop, target, loops);
        let update = self.check_block(update, frame.scope());
        let body = body.map(|body| Box::new(self.scoped(|this| this.check_stmt(body, frame.scope()))));
        TypedStmtKind::For {
            target,
            init,
            condition,
            update,
            body,
        }
    }

    fn check_switch(
        &mut self,
        line: u32,
        discriminant: &Expr,
        groups: &[SwitchGroup],
        loops: LoopScope<'_>,
    ) -> TypedStmtKind {
        let discriminant = self.check_expr(discriminant);
        if !discriminant.ty.matches(Type::Int) {
            self.error(
                line,
                ErrorKind::SwitchType,
                format!("Switch expression must be of type int, found {}", discriminant.ty),
            );
        }

        let target = self.fresh_target();
        let frame = LoopFrame::new(FrameKind::Switch, target, loops);
        let mut seen = FxHashSet::default();
        let mut has_default = false;
        let mut typed_groups = Vec::with_capacity(groups.len());
        for group in groups {
            let mut labels = Vec::with_capacity(group.labels.len());
            for label in &group.labels {
                match label {
                    CaseLabel::Case(expr) => match case_constant(expr) {
                        Some(value) => {
                            if !seen.insert(value) {
                                self.error(
                                    expr_line(expr, line),
                                    ErrorKind::DuplicateCase,
                                    format!("Duplicate case label {} in switch", value),
                                );
                            }
                            labels.push(SwitchLabel::Case(value));
                        }
                        None => {
                            self.error(
                                expr_line(expr, line),
                                ErrorKind::NonConstantCase,
                                format!("Case label {} is not an int constant", expr),
                            );
                        }
                    },
                    CaseLabel::Default => {
                        if has_default {
                            self.error(line, ErrorKind::DuplicateDefault, "Duplicate default label in switch");
                        }
                        has_default = true;
                        labels.push(SwitchLabel::Default);
                    }
                }
            }
            // groups share the enclosing scope
            let block = self.check_block(&group.block, frame.scope());
            typed_groups.push(TypedGroup { labels, block });
        }

        TypedStmtKind::Switch {
            target,
            discriminant,
            groups: typed_groups,
        }
    }

    fn check_return(&mut self, line: u32, value: Option<&Expr>) -> TypedStmtKind {
        let value = value.map(|value| self.check_expr(value));
        match (self.returns, &value) {
            (Some(expected), Some(typed)) => {
                if !typed.ty.matches(expected) {
                    self.error(
                        line,
                        ErrorKind::ReturnType,
                        format!("Return type {} doesn't match declared type {}", typed.ty, expected),
                    );
                }
            }
            (Some(expected), None) => {
                self.error(line, ErrorKind::ReturnType, format!("Missing return value of type {}", expected));
            }
            (None, Some(_)) => {
                self.error(line, ErrorKind::ReturnType, "Unexpected return value");
            }
            (None, None) => {}
        }
        TypedStmtKind::Return { value }
    }
}

/// Integer value of a case label: an int literal, optionally negated.
fn case_constant(expr: &Expr) -> Option<i32> {
    match &expr.kind {
        ExprKind::Literal(Literal::Int(value)) => Some(*value),
        ExprKind::Unary {
            op: UnaryOp::Negate,
            operand,
        } => match operand.kind {
            ExprKind::Literal(Literal::Int(value)) => Some(value.wrapping_neg()),
            _ => None,
        },
        _ => None,
    }
}

fn expr_line(expr: &Expr, fallback: u32) -> u32 {
    if expr.line == 0 { fallback } else { expr.line }
}
