use anyhow::Result;
use tracing::trace;

use super::builder::{CodeGen, JumpLabels};
use crate::typ::typed::{SwitchLabel, TargetId, TypedExpr, TypedGroup, TypedStmt, TypedStmtKind};
use crate::vm::Op;

impl CodeGen<'_> {
    pub fn stmt(&mut self, stmt: &TypedStmt) -> Result<()> {
        match &stmt.kind {
            TypedStmtKind::Block(statements) => {
                for stmt in statements {
                    self.stmt(stmt)?;
                }
            }
            TypedStmtKind::Local { slot, init } => {
                if let Some(init) = init {
                    self.value(init)?;
                    self.emit(Op::Store(slot.ty.storage_kind(), slot.slot));
                }
            }
            TypedStmtKind::Expr(expr) => self.expr(expr, super::Usage::Discard)?,
            TypedStmtKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                let else_label = self.label();
                self.branch(condition, else_label, false)?;
                self.stmt(then_stmt)?;
                match else_stmt {
                    Some(else_stmt) => {
                        let end = self.label();
                        self.goto(end);
                        self.bind(else_label);
                        self.stmt(else_stmt)?;
                        self.bind(end);
                    }
                    None => self.bind(else_label),
                }
            }
            TypedStmtKind::While {
                target,
                condition,
                body,
            } => {
                trace!(line = stmt.line, "lower while");
                let test = self.label();
                let end = self.label();
                self.enter_target(
                    *target,
                    JumpLabels {
                        break_label: end,
                        continue_label: Some(test),
                    },
                );
                self.bind(test);
                self.branch(condition, end, false)?;
                self.stmt(body)?;
                self.goto(test);
                self.bind(end);
            }
            TypedStmtKind::Do {
                target,
                body,
                condition,
            } => {
                trace!(line = stmt.line, "lower do");
                let top = self.label();
                let test = self.label();
                let end = self.label();
                self.enter_target(
                    *target,
                    JumpLabels {
                        break_label: end,
                        continue_label: Some(test),
                    },
                );
                self.bind(top);
                self.stmt(body)?;
                // continue lands here and re-tests the condition
                self.bind(test);
                self.branch(condition, top, true)?;
                self.bind(end);
            }
            TypedStmtKind::For {
                target,
                init,
                condition,
                update,
                body,
            } => {
                trace!(line = stmt.line, "lower for");
                self.for_loop(*target, init, condition.as_ref(), update, body.as_deref())?;
            }
            TypedStmtKind::Switch {
                target,
                discriminant,
                groups,
            } => {
                trace!(line = stmt.line, groups = groups.len(), "lower switch");
                self.switch(*target, discriminant, groups)?;
            }
            TypedStmtKind::Break { target } => {
                if let Some(target) = target {
                    let labels = self.jump_labels(*target)?;
                    self.goto(labels.break_label);
                }
            }
            TypedStmtKind::Continue { target } => {
                // an unresolved continue was already reported; emit nothing
                if let Some(target) = target
                    && let Some(label) = self.jump_labels(*target)?.continue_label
                {
                    self.goto(label);
                }
            }
            TypedStmtKind::Return { value } => match value {
                Some(value) => {
                    self.value(value)?;
                    self.emit(Op::ReturnValue(value.ty.storage_kind()));
                }
                None => self.emit(Op::Return),
            },
            TypedStmtKind::Empty => {}
        }
        Ok(())
    }

    /// Test-at-bottom layout with a single entry jump:
    ///
    /// ```text
    ///       init
    ///       goto test
    /// top:  body
    /// cont: update
    /// test: if cond goto top   (or goto top without a condition)
    /// end:
    /// ```
    fn for_loop(
        &mut self,
        target: TargetId,
        init: &[TypedStmt],
        condition: Option<&TypedExpr>,
        update: &[TypedStmt],
        body: Option<&TypedStmt>,
    ) -> Result<()> {
        for stmt in init {
            self.stmt(stmt)?;
        }
        let top = self.label();
        let cont = self.label();
        let test = self.label();
        let end = self.label();
        self.enter_target(
            target,
            JumpLabels {
                break_label: end,
                continue_label: Some(cont),
            },
        );

        self.goto(test);
        self.bind(top);
        if let Some(body) = body {
            self.stmt(body)?;
        }
        self.bind(cont);
        for stmt in update {
            self.stmt(stmt)?;
        }
        self.bind(test);
        match condition {
            Some(condition) => self.branch(condition, top, true)?,
            None => self.goto(top),
        }
        self.bind(end);
        Ok(())
    }

    fn switch(&mut self, target: TargetId, discriminant: &TypedExpr, groups: &[TypedGroup]) -> Result<()> {
        self.value(discriminant)?;
        let end = self.label();
        self.enter_target(
            target,
            JumpLabels {
                break_label: end,
                continue_label: None,
            },
        );

        let mut keys = Vec::new();
        let mut case_labels = Vec::new();
        // per group, the labels it binds
        let mut entries = Vec::with_capacity(groups.len());
        let mut default = None;
        for group in groups {
            let mut bound = Vec::with_capacity(group.labels.len());
            for label in &group.labels {
                match label {
                    SwitchLabel::Case(value) => {
                        let case = self.label();
                        keys.push(*value);
                        case_labels.push(case);
                        bound.push(case);
                    }
                    SwitchLabel::Default => {
                        let label = *default.get_or_insert_with(|| self.out.create_label());
                        bound.push(label);
                    }
                }
            }
            entries.push(bound);
        }

        self.out.add_table_switch(&keys, &case_labels, default.unwrap_or(end));

        for (group, bound) in groups.iter().zip(entries) {
            for label in bound {
                self.bind(label);
            }
            for stmt in &group.block {
                self.stmt(stmt)?;
            }
        }
        self.bind(end);
        Ok(())
    }
}
