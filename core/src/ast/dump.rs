use super::{CaseLabel, Expr, ExprKind, Stmt, StmtKind, SwitchGroup, Unit};
use serde::Serialize;

/// Generic labelled tree mirroring the AST, for external inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpNode {
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpNode>,
}

impl DumpNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Appends a child and returns it for further nesting.
    pub fn add_child(&mut self, label: impl Into<String>) -> &mut DumpNode {
        self.children.push(DumpNode::new(label));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(DumpNode::size).sum::<usize>()
    }
}

impl Unit {
    pub fn dump(&self) -> DumpNode {
        let mut root = DumpNode::new(format!("CompilationUnit {}", self.name));
        if !self.fields.is_empty() {
            let fields = root.add_child("Fields");
            for field in &self.fields {
                fields.add_child(format!("{} {}", field.ty, field.name));
            }
        }
        let body = root.add_child("Body");
        for stmt in &self.body {
            stmt.dump_into(body);
        }
        root
    }
}

impl Stmt {
    pub fn dump_into(&self, parent: &mut DumpNode) {
        let line = self.line;
        match &self.kind {
            StmtKind::Block(statements) => {
                let node = parent.add_child(format!("Block:{}", line));
                for stmt in statements {
                    stmt.dump_into(node);
                }
            }
            StmtKind::Local { name, ty, init } => {
                let node = parent.add_child(format!("LocalVariableDeclaration:{} {} {}", line, ty, name));
                if let Some(init) = init {
                    init.dump_into(node.add_child("Initializer"));
                }
            }
            StmtKind::Expr(expr) => {
                let node = parent.add_child(format!("StatementExpression:{}", line));
                expr.dump_into(node);
            }
            StmtKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => {
                let node = parent.add_child(format!("IfStatement:{}", line));
                condition.dump_into(node.add_child("Condition"));
                then_stmt.dump_into(node.add_child("ThenPart"));
                if let Some(else_stmt) = else_stmt {
                    else_stmt.dump_into(node.add_child("ElsePart"));
                }
            }
            StmtKind::While { condition, body } => {
                let node = parent.add_child(format!("WhileStatement:{}", line));
                condition.dump_into(node.add_child("Condition"));
                body.dump_into(node.add_child("Body"));
            }
            StmtKind::Do { body, condition } => {
                let node = parent.add_child(format!("DoStatement:{}", line));
                body.dump_into(node.add_child("Body"));
                condition.dump_into(node.add_child("Condition"));
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let node = parent.add_child(format!("ForStatement:{}", line));
                if !init.is_empty() {
                    let section = node.add_child("Init");
                    for stmt in init {
                        stmt.dump_into(section);
                    }
                }
                if let Some(condition) = condition {
                    condition.dump_into(node.add_child("Condition"));
                }
                if !update.is_empty() {
                    let section = node.add_child("Update");
                    for stmt in update {
                        stmt.dump_into(section);
                    }
                }
                if let Some(body) = body {
                    body.dump_into(node.add_child("Body"));
                }
            }
            StmtKind::Switch { discriminant, groups } => {
                let node = parent.add_child(format!("SwitchStatement:{}", line));
                discriminant.dump_into(node.add_child("Condition"));
                for group in groups {
                    group.dump_into(node);
                }
            }
            StmtKind::Break => {
                parent.add_child(format!("BreakStatement:{}", line));
            }
            StmtKind::Continue => {
                parent.add_child(format!("ContinueStatement:{}", line));
            }
            StmtKind::Return { value } => {
                let node = parent.add_child(format!("ReturnStatement:{}", line));
                if let Some(value) = value {
                    value.dump_into(node.add_child("Expression"));
                }
            }
            StmtKind::Empty => {
                parent.add_child(format!("EmptyStatement:{}", line));
            }
        }
    }
}

impl SwitchGroup {
    pub fn dump_into(&self, parent: &mut DumpNode) {
        let node = parent.add_child("SwitchStatementGroup");
        for label in &self.labels {
            match label {
                CaseLabel::Case(value) => value.dump_into(node.add_child("Case")),
                CaseLabel::Default => {
                    node.add_child("Default");
                }
            }
        }
        for stmt in &self.block {
            stmt.dump_into(node);
        }
    }
}

impl Expr {
    pub fn dump_into(&self, parent: &mut DumpNode) {
        let line = self.line;
        match &self.kind {
            ExprKind::Literal(lit) => {
                parent.add_child(format!("Literal:{} {} {}", line, lit.ty(), lit));
            }
            ExprKind::Var(name) => {
                parent.add_child(format!("Variable:{} {}", line, name));
            }
            ExprKind::Field(name) => {
                parent.add_child(format!("FieldSelection:{} {}", line, name));
            }
            ExprKind::Unary { op, operand } => {
                let label = match op {
                    super::UnaryOp::Negate => "NegateOp",
                    super::UnaryOp::Not => "LogicalNotOp",
                };
                let node = parent.add_child(format!("{}:{}", label, line));
                operand.dump_into(node.add_child("Operand"));
            }
            ExprKind::IncDec { op, operand } => {
                let label = match op {
                    super::IncDecOp::PreInc => "PreIncrementOp",
                    super::IncDecOp::PreDec => "PreDecrementOp",
                    super::IncDecOp::PostInc => "PostIncrementOp",
                    super::IncDecOp::PostDec => "PostDecrementOp",
                };
                let node = parent.add_child(format!("{}:{}", label, line));
                operand.dump_into(node.add_child("Operand"));
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let node = parent.add_child(format!("BinaryExpression:{} {}", line, op));
                lhs.dump_into(node.add_child("Operand1"));
                rhs.dump_into(node.add_child("Operand2"));
            }
            ExprKind::Assign { target, value } => {
                let node = parent.add_child(format!("AssignOp:{}", line));
                target.dump_into(node.add_child("Operand1"));
                value.dump_into(node.add_child("Operand2"));
            }
        }
    }
}
