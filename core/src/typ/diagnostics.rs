use std::fmt;

use tracing::debug;

/// Categories of semantic errors reported during checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Loop or `if` condition is not boolean.
    ConditionType,
    /// `++`/`--` or assignment applied to something that is not a location.
    NotAssignable,
    /// Operator applied to operands of the wrong type.
    OperandType,
    /// Switch discriminant is not an int.
    SwitchType,
    DuplicateCase,
    DuplicateDefault,
    /// Case label that is not an int constant.
    NonConstantCase,
    MisplacedContinue,
    MisplacedBreak,
    TypeMismatch,
    UndefinedName,
    Redeclared,
    /// Expression used as a statement that has no side effect.
    NotAStatement,
    ReturnType,
}

/// A recoverable semantic error tied to a source line.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub line: u32,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for SemanticError {}

/// Every error a failed check produced, in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticErrors {
    pub errors: Vec<SemanticError>,
    /// Reports dropped after the error limit was reached.
    pub suppressed: usize,
}

impl SemanticErrors {
    pub fn total(&self) -> usize {
        self.errors.len() + self.suppressed
    }
}

impl fmt::Display for SemanticErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} semantic error(s)", self.total())?;
        for err in &self.errors {
            write!(f, "\n  {}", err)?;
        }
        if self.suppressed > 0 {
            write!(f, "\n  ... {} more not shown", self.suppressed)?;
        }
        Ok(())
    }
}

impl std::error::Error for SemanticErrors {}

/// Central error sink. Reporting never aborts the caller.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<SemanticError>,
    max_errors: Option<usize>,
    suppressed: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop recording after `max_errors` entries; later reports are only counted.
    pub fn with_limit(max_errors: Option<usize>) -> Self {
        Self {
            max_errors,
            ..Self::default()
        }
    }

    pub fn report(&mut self, line: u32, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        debug!(line, ?kind, %message, "semantic error");
        if self.max_errors.is_some_and(|max| self.errors.len() >= max) {
            self.suppressed += 1;
            return;
        }
        self.errors.push(SemanticError { line, kind, message });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.suppressed > 0
    }

    /// Total number of reports, suppressed ones included.
    pub fn len(&self) -> usize {
        self.errors.len() + self.suppressed
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &SemanticError> + '_ {
        self.errors.iter().filter(move |err| err.kind == kind)
    }

    /// `Ok` when nothing was reported, otherwise a [`SemanticErrors`] wrapped in anyhow.
    pub fn into_result(self) -> anyhow::Result<()> {
        if !self.has_errors() {
            return Ok(());
        }
        Err(anyhow::Error::new(SemanticErrors {
            errors: self.errors,
            suppressed: self.suppressed,
        }))
    }
}
