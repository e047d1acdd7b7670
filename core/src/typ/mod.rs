//! Type facility shared by the checker and the compiler.

mod diagnostics;
mod numeric;
pub mod type_checker;
pub mod typed;

pub use diagnostics::{Diagnostics, ErrorKind, SemanticError, SemanticErrors};
pub use numeric::NumericKind;
pub use type_checker::{Analysis, TypeChecker};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of types the language knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Long,
    Double,
    Boolean,
    /// The error type. Anything compared against it matches, so a single
    /// mistake is reported once instead of at every use.
    Any,
}

impl Type {
    pub fn is_any(self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_numeric(self) -> bool {
        NumericKind::classify(self).is_some()
    }

    /// Equality that lets the error type through.
    pub fn matches(self, expected: Type) -> bool {
        self == expected || self.is_any() || expected.is_any()
    }

    /// Reports a type mismatch at `line` unless `self` matches `expected`.
    pub fn must_match_expected(self, line: u32, expected: Type, diagnostics: &mut Diagnostics) -> bool {
        if self.matches(expected) {
            return true;
        }
        diagnostics.report(
            line,
            ErrorKind::TypeMismatch,
            format!("Type {} doesn't match type {}", self, expected),
        );
        false
    }

    /// Storage class used by loads, stores and returns; booleans live in int slots.
    pub fn storage_kind(self) -> NumericKind {
        match self {
            Type::Long => NumericKind::Long,
            Type::Double => NumericKind::Double,
            Type::Int | Type::Boolean | Type::Any => NumericKind::Int,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Int => "int",
            Type::Long => "long",
            Type::Double => "double",
            Type::Boolean => "boolean",
            Type::Any => "any",
        };
        f.write_str(name)
    }
}
