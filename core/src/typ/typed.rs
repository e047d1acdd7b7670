//! Annotated tree produced by the checker and consumed by codegen.
//!
//! Every expression carries its resolved [`Type`], every name is resolved to a
//! [`Place`], and every `break`/`continue` names the construct it leaves by
//! [`TargetId`]. Nodes that failed checking become [`TypedExprKind::Error`]
//! and are never lowered.

use crate::ast::{BinOp, FieldDecl, IncDecOp, Literal};
use crate::typ::Type;
use std::fmt;

/// Identity of a breakable construct, unique within one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedUnit {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub returns: Option<Type>,
    /// Local slots in use, the receiver in slot 0 included.
    pub max_locals: u16,
    pub body: Vec<TypedStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStmt {
    pub line: u32,
    pub kind: TypedStmtKind,
}

impl TypedStmt {
    pub fn new(line: u32, kind: TypedStmtKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmtKind {
    Block(Vec<TypedStmt>),
    Local {
        slot: LocalSlot,
        init: Option<TypedExpr>,
    },
    /// Statement expression; its value is always discarded.
    Expr(TypedExpr),
    If {
        condition: TypedExpr,
        then_stmt: Box<TypedStmt>,
        else_stmt: Option<Box<TypedStmt>>,
    },
    While {
        target: TargetId,
        condition: TypedExpr,
        body: Box<TypedStmt>,
    },
    Do {
        target: TargetId,
        body: Box<TypedStmt>,
        condition: TypedExpr,
    },
    For {
        target: TargetId,
        init: Vec<TypedStmt>,
        condition: Option<TypedExpr>,
        update: Vec<TypedStmt>,
        body: Option<Box<TypedStmt>>,
    },
    Switch {
        target: TargetId,
        discriminant: TypedExpr,
        groups: Vec<TypedGroup>,
    },
    /// `None` only when checking already reported the statement as misplaced.
    Break {
        target: Option<TargetId>,
    },
    Continue {
        target: Option<TargetId>,
    },
    Return {
        value: Option<TypedExpr>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedGroup {
    pub labels: Vec<SwitchLabel>,
    pub block: Vec<TypedStmt>,
}

impl TypedGroup {
    pub fn has_default(&self) -> bool {
        self.labels.iter().any(|label| matches!(label, SwitchLabel::Default))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchLabel {
    Case(i32),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub line: u32,
    pub ty: Type,
    pub kind: TypedExprKind,
}

impl TypedExpr {
    pub fn new(line: u32, ty: Type, kind: TypedExprKind) -> Self {
        Self { line, ty, kind }
    }

    /// Placeholder for a node that failed checking; typed `Any`.
    pub fn error(line: u32) -> Self {
        Self::new(line, Type::Any, TypedExprKind::Error)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypedExprKind::Error)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    Literal(Literal),
    Load(Place),
    Negate(Box<TypedExpr>),
    Not(Box<TypedExpr>),
    IncDec { op: IncDecOp, place: Place },
    Binary {
        op: BinOp,
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Assign { place: Place, value: Box<TypedExpr> },
    Error,
}

/// An assignable location, classified once during checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// Named local storage; supports the in-place `Inc` fast path.
    Local(LocalSlot),
    /// Field of the receiver; needs the full address/load/store protocol.
    Field(FieldPlace),
}

impl Place {
    pub fn ty(self) -> Type {
        match self {
            Place::Local(local) => local.ty,
            Place::Field(field) => field.ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSlot {
    pub slot: u16,
    pub ty: Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPlace {
    /// Index into the unit's field list.
    pub index: u16,
    pub ty: Type,
}
