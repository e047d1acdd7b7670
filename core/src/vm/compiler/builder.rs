use anyhow::{Result, anyhow};
use rustc_hash::FxHashMap;

use crate::typ::typed::{TargetId, TypedUnit};
use crate::vm::{Branch, Label, Op};

/// Instruction sink driven by the code generator.
///
/// Labels are write-once: each is bound to a single program point with
/// [`Emitter::add_label`], but may be referenced by any number of branches
/// before or after that.
pub trait Emitter {
    fn create_label(&mut self) -> Label;
    fn add_label(&mut self, label: Label);
    /// Appends an instruction that carries no label operand.
    fn add(&mut self, op: Op);
    fn add_inc(&mut self, slot: u16, delta: i32);
    fn add_branch(&mut self, branch: Branch, target: Label);
    /// Multi-way dispatch on the int on top of the stack. Missing keys go to `default`.
    fn add_table_switch(&mut self, keys: &[i32], labels: &[Label], default: Label);
}

/// Whether the enclosing computation consumes an expression's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Usage {
    Value,
    /// Statement expression: nothing may be left on the stack.
    Discard,
}

impl Usage {
    pub fn needs_value(self) -> bool {
        matches!(self, Usage::Value)
    }
}

/// Exit and re-entry points of one breakable construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JumpLabels {
    pub break_label: Label,
    /// `None` for a switch.
    pub continue_label: Option<Label>,
}

/// Lowers a checked unit into emitter calls.
pub struct CodeGen<'a> {
    pub(super) out: &'a mut dyn Emitter,
    targets: FxHashMap<TargetId, JumpLabels>,
}

impl<'a> CodeGen<'a> {
    pub fn new(out: &'a mut dyn Emitter) -> Self {
        Self {
            out,
            targets: FxHashMap::default(),
        }
    }

    /// Lowers the whole body and closes it with a bare return.
    pub fn unit(&mut self, unit: &TypedUnit) -> Result<()> {
        for stmt in &unit.body {
            self.stmt(stmt)?;
        }
        self.emit(Op::Return);
        Ok(())
    }

    pub(super) fn emit(&mut self, op: Op) {
        self.out.add(op);
    }

    pub(super) fn label(&mut self) -> Label {
        self.out.create_label()
    }

    pub(super) fn bind(&mut self, label: Label) {
        self.out.add_label(label);
    }

    pub(super) fn goto(&mut self, target: Label) {
        self.out.add_branch(Branch::Goto, target);
    }

    /// Registers a construct's labels before its body is lowered.
    pub(super) fn enter_target(&mut self, target: TargetId, labels: JumpLabels) {
        self.targets.insert(target, labels);
    }

    pub(super) fn jump_labels(&self, target: TargetId) -> Result<JumpLabels> {
        self.targets
            .get(&target)
            .copied()
            .ok_or_else(|| anyhow!("jump to construct {} before it was lowered", target))
    }
}
