use crate::ast::Unit;
use crate::typ::typed::{TargetId, TypedUnit};
use crate::typ::{Diagnostics, ErrorKind, Type};
use tracing::debug;

mod context;
mod expressions;
mod loops;
mod statements;

pub use context::Context;
pub use loops::{FrameKind, LoopFrame, LoopScope};


/// Result of checking one unit. The tree is only fit for codegen when
/// `diagnostics` is empty.
#[derive(Debug)]
pub struct Analysis {
    pub unit: TypedUnit,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// The typed tree, or every reported error as one `anyhow` error.
    pub fn into_result(self) -> anyhow::Result<TypedUnit> {
        self.diagnostics.into_result()?;
        Ok(self.unit)
    }
}

/// Semantic checker for one unit.
///
/// Produces a new [`TypedUnit`] instead of annotating the input. Errors are
/// reported and checking continues; a failed node types to [`Type::Any`] so
/// that it does not trigger further errors upstream.
#[derive(Debug, Default)]
pub struct TypeChecker {
    context: Context,
    diagnostics: Diagnostics,
    next_target: u32,
    /// Declared result type of the body being checked.
    returns: Option<Type>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checker that records at most `max_errors` errors.
    pub fn with_limit(max_errors: Option<usize>) -> Self {
        Self {
            diagnostics: Diagnostics::with_limit(max_errors),
            ..Self::default()
        }
    }

    pub fn check_unit(mut self, unit: &Unit) -> Analysis {
        for (index, field) in unit.fields.iter().enumerate() {
            let index = u16::try_from(index).unwrap_or(u16::MAX);
            if !self.context.add_field(index, field) {
                self.error(0, ErrorKind::Redeclared, format!("Field {} is already defined", field.name));
            }
        }
        self.returns = unit.returns;

        let body = self.check_block(&unit.body, LoopScope::root());
        let typed = TypedUnit {
            name: unit.name.clone(),
            fields: unit.fields.clone(),
            returns: unit.returns,
            max_locals: self.context.max_locals(),
            body,
        };
        debug!(
            unit = %unit.name,
            errors = self.diagnostics.len(),
            locals = typed.max_locals,
            "checked unit"
        );
        Analysis {
            unit: typed,
            diagnostics: self.diagnostics,
        }
    }

    fn fresh_target(&mut self) -> TargetId {
        let id = TargetId(self.next_target);
        self.next_target += 1;
        id
    }

    /// Runs `f` inside a fresh lexical scope.
    fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.context.push_scope();
        let result = f(self);
        self.context.pop_scope();
        result
    }

    fn error(&mut self, line: u32, kind: ErrorKind, message: impl Into<String>) {
        self.diagnostics.report(line, kind, message);
    }
}
