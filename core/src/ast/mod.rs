//! Surface syntax tree as produced by the parser.
//!
//! Nodes are plain data: the checker reads them and builds a separate typed
//! tree (see [`crate::typ::typed`]), so nothing here is mutated after parsing.

mod display;
mod dump;

pub use dump::DumpNode;

use crate::typ::Type;
use serde::{Deserialize, Serialize};

/// One compilation unit: a receiver with named fields and a single method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Declared result type of the body; `None` for a body without a value.
    #[serde(default)]
    pub returns: Option<Type>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    #[serde(default)]
    pub line: u32,
    pub kind: StmtKind,
}

/// Statement grammar:
///
/// ```text
/// stmt ::= block | local | expr ';' | if | while | do | for | switch
///        | 'break' ';' | 'continue' ';' | 'return' [expr] ';' | ';'
/// do     ::= 'do' stmt 'while' '(' expr ')' ';'
/// for    ::= 'for' '(' [stmt {',' stmt}] ';' [expr] ';' [stmt {',' stmt}] ')' stmt
/// switch ::= 'switch' '(' expr ')' '{' { label+ stmt* } '}'
/// label  ::= 'case' int ':' | 'default' ':'
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// `ty name [= init];`
    Local {
        name: String,
        ty: Type,
        init: Option<Expr>,
    },
    /// Expression evaluated for its side effect only.
    Expr(Expr),
    If {
        condition: Expr,
        then_stmt: Box<Stmt>,
        else_stmt: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Do {
        body: Box<Stmt>,
        condition: Expr,
    },
    /// Every part may be absent; `for (;;)` loops forever.
    For {
        #[serde(default)]
        init: Vec<Stmt>,
        condition: Option<Expr>,
        #[serde(default)]
        update: Vec<Stmt>,
        body: Option<Box<Stmt>>,
    },
    Switch {
        discriminant: Expr,
        groups: Vec<SwitchGroup>,
    },
    Break,
    Continue,
    Return {
        value: Option<Expr>,
    },
    Empty,
}

/// Consecutive case labels sharing one block. Blocks fall through into the
/// next group unless they break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchGroup {
    pub labels: Vec<CaseLabel>,
    #[serde(default)]
    pub block: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseLabel {
    Case(Expr),
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default)]
    pub line: u32,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Literal(Literal),
    /// A name; resolves to a local, or to a field when no local shadows it.
    Var(String),
    /// Explicit `this.name`.
    Field(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    IncDec {
        op: IncDecOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
}

impl Literal {
    pub fn ty(self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Long(_) => Type::Long,
            Literal::Double(_) => Type::Double,
            Literal::Bool(_) => Type::Boolean,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// `-e`
    Negate,
    /// `!e`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncDecOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl IncDecOp {
    pub fn is_prefix(self) -> bool {
        matches!(self, IncDecOp::PreInc | IncDecOp::PreDec)
    }

    pub fn is_increment(self) -> bool {
        matches!(self, IncDecOp::PreInc | IncDecOp::PostInc)
    }

    /// Signed step applied to the location.
    pub fn delta(self) -> i32 {
        if self.is_increment() { 1 } else { -1 }
    }

    pub fn symbol(self) -> &'static str {
        if self.is_increment() { "++" } else { "--" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    pub fn is_arith(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem)
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn is_comparison(self) -> bool {
        self.is_ordering() || self.is_equality()
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self { line: 0, kind }
    }

    /// Sets the source line of this node.
    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn int(value: i32) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)))
    }

    pub fn long(value: i64) -> Self {
        Self::new(ExprKind::Literal(Literal::Long(value)))
    }

    pub fn double(value: f64) -> Self {
        Self::new(ExprKind::Literal(Literal::Double(value)))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn var(name: &str) -> Self {
        Self::new(ExprKind::Var(name.to_string()))
    }

    pub fn field(name: &str) -> Self {
        Self::new(ExprKind::Field(name.to_string()))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn neg(operand: Expr) -> Self {
        Self::unary(UnaryOp::Negate, operand)
    }

    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, operand)
    }

    pub fn inc_dec(op: IncDecOp, operand: Expr) -> Self {
        Self::new(ExprKind::IncDec {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::new(ExprKind::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// Whether the parser would accept this expression as an assignment target.
    pub fn is_lhs(&self) -> bool {
        matches!(self.kind, ExprKind::Var(_) | ExprKind::Field(_))
    }
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self { line: 0, kind }
    }

    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn block(statements: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(statements))
    }

    pub fn local(name: &str, ty: Type, init: Option<Expr>) -> Self {
        Self::new(StmtKind::Local {
            name: name.to_string(),
            ty,
            init,
        })
    }

    pub fn expr(expr: Expr) -> Self {
        let line = expr.line;
        Self::new(StmtKind::Expr(expr)).at(line)
    }

    pub fn if_else(condition: Expr, then_stmt: Stmt, else_stmt: Option<Stmt>) -> Self {
        Self::new(StmtKind::If {
            condition,
            then_stmt: Box::new(then_stmt),
            else_stmt: else_stmt.map(Box::new),
        })
    }

    pub fn while_loop(condition: Expr, body: Stmt) -> Self {
        Self::new(StmtKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn do_while(body: Stmt, condition: Expr) -> Self {
        Self::new(StmtKind::Do {
            body: Box::new(body),
            condition,
        })
    }

    pub fn for_loop(init: Vec<Stmt>, condition: Option<Expr>, update: Vec<Stmt>, body: Option<Stmt>) -> Self {
        Self::new(StmtKind::For {
            init,
            condition,
            update,
            body: body.map(Box::new),
        })
    }

    pub fn switch(discriminant: Expr, groups: Vec<SwitchGroup>) -> Self {
        Self::new(StmtKind::Switch { discriminant, groups })
    }

    pub fn break_stmt() -> Self {
        Self::new(StmtKind::Break)
    }

    pub fn continue_stmt() -> Self {
        Self::new(StmtKind::Continue)
    }

    pub fn return_stmt(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return { value })
    }
}

impl SwitchGroup {
    pub fn new(labels: Vec<CaseLabel>, block: Vec<Stmt>) -> Self {
        Self { labels, block }
    }
}

impl CaseLabel {
    pub fn case(value: i32) -> Self {
        CaseLabel::Case(Expr::int(value))
    }
}

impl Unit {
    pub fn new(name: &str, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            returns: None,
            body,
        }
    }

    pub fn with_field(mut self, name: &str, ty: Type) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            ty,
        });
        self
    }

    pub fn returning(mut self, ty: Type) -> Self {
        self.returns = Some(ty);
        self
    }
}
