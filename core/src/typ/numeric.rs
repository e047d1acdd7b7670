use super::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric kinds with their own instruction variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Int,
    Long,
    Double,
}

impl NumericKind {
    /// Classify a type into a numeric kind, if it is one.
    pub fn classify(ty: Type) -> Option<NumericKind> {
        match ty {
            Type::Int => Some(NumericKind::Int),
            Type::Long => Some(NumericKind::Long),
            Type::Double => Some(NumericKind::Double),
            Type::Boolean | Type::Any => None,
        }
    }

    pub fn to_type(self) -> Type {
        match self {
            NumericKind::Int => Type::Int,
            NumericKind::Long => Type::Long,
            NumericKind::Double => Type::Double,
        }
    }

    /// Instruction mnemonic prefix (`i`, `l`, `d`).
    pub fn prefix(self) -> char {
        match self {
            NumericKind::Int => 'i',
            NumericKind::Long => 'l',
            NumericKind::Double => 'd',
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_type(), f)
    }
}
