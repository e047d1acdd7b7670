use anyhow::Result;
use tracing::debug;

use super::builder::CodeGen;
use super::options::CompileOptions;
use crate::ast::Unit;
use crate::typ::typed::TypedUnit;
use crate::typ::{Analysis, Diagnostics, TypeChecker};
use crate::vm::{Assembler, CodeUnit};

/// Check, lower and assemble one unit.
///
/// Codegen only ever sees a tree that checked without errors.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn analyze(&self, unit: &Unit) -> Analysis {
        TypeChecker::with_limit(self.options.max_errors).check_unit(unit)
    }

    /// Runs checking only.
    pub fn check(&self, unit: &Unit) -> Diagnostics {
        self.analyze(unit).diagnostics
    }

    pub fn compile(&self, unit: &Unit) -> Result<CodeUnit> {
        let typed = self.analyze(unit).into_result()?;
        self.lower(&typed)
    }

    /// Lowers an already checked unit.
    pub fn lower(&self, unit: &TypedUnit) -> Result<CodeUnit> {
        let mut asm = Assembler::new()
            .with_min_table_density(self.options.switch.min_table_density)
            .with_stack_verification(self.options.verify_stack);
        CodeGen::new(&mut asm).unit(unit)?;
        let code = asm.finish(&unit.name, unit.max_locals, unit.fields.clone())?;
        debug!(
            unit = %unit.name,
            ops = code.ops.len(),
            max_stack = code.max_stack,
            "compiled unit"
        );
        Ok(code)
    }
}
