use anyhow::{Context as _, Result, anyhow, bail};
use tracing::trace;

use super::bytecode::{Branch, CodeUnit, Label, Op};
use super::compiler::Emitter;
use crate::ast::FieldDecl;

/// Upper bound on table switch entries, whatever the density.
const MAX_TABLE_LEN: i64 = 1 << 16;

#[derive(Debug, Clone, Copy)]
enum Slot {
    /// The single offset of `Goto`/`If`/`IfICmp`.
    Branch,
    SwitchDefault,
    /// Entry `n` of a table, or pair `n` of a lookup switch.
    SwitchArm(usize),
}

#[derive(Debug, Clone, Copy)]
struct Fixup {
    at: usize,
    slot: Slot,
    label: Label,
}

/// The instruction emitter: collects ops, binds labels and patches every
/// branch once the whole body has been emitted.
#[derive(Debug)]
pub struct Assembler {
    ops: Vec<Op>,
    labels: Vec<Option<usize>>,
    fixups: Vec<Fixup>,
    binding_errors: Vec<String>,
    min_table_density: f64,
    verify_stack: bool,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
            binding_errors: Vec::new(),
            min_table_density: 0.5,
            verify_stack: true,
        }
    }

    /// Fraction of a key range that must be populated before a table switch is used.
    pub fn with_min_table_density(mut self, density: f64) -> Self {
        self.min_table_density = density;
        self
    }

    pub fn with_stack_verification(mut self, enabled: bool) -> Self {
        self.verify_stack = enabled;
        self
    }

    /// Index the next emitted op will get.
    pub fn position(&self) -> usize {
        self.ops.len()
    }

    fn push_fixup(&mut self, slot: Slot, label: Label) {
        self.fixups.push(Fixup {
            at: self.ops.len(),
            slot,
            label,
        });
    }

    fn resolve(&self, label: Label) -> Result<usize> {
        let bound = self
            .labels
            .get(label.0 as usize)
            .ok_or_else(|| anyhow!("label {} was never created", label))?;
        let pos = bound.ok_or_else(|| anyhow!("label {} was never bound", label))?;
        if pos >= self.ops.len() {
            bail!("label {} is bound past the last instruction", label);
        }
        Ok(pos)
    }

    /// Resolves all fixups and, unless disabled, verifies stack discipline.
    pub fn finish(mut self, name: &str, max_locals: u16, fields: Vec<FieldDecl>) -> Result<CodeUnit> {
        if let Some(message) = self.binding_errors.first() {
            bail!("{}", message);
        }
        let fixups = std::mem::take(&mut self.fixups);
        for fixup in fixups {
            let target = self.resolve(fixup.label)?;
            let ofs = i32::try_from(target as i64 - fixup.at as i64).context("branch offset out of range")?;
            patch(&mut self.ops[fixup.at], fixup.slot, ofs)
                .with_context(|| format!("patching op {} in {}", fixup.at, name))?;
        }
        let max_stack = if self.verify_stack {
            verify_stack(&self.ops).with_context(|| format!("stack verification failed for {}", name))?
        } else {
            0
        };
        trace!(unit = name, ops = self.ops.len(), max_stack, "assembled");
        Ok(CodeUnit {
            name: name.to_string(),
            ops: self.ops,
            max_stack,
            max_locals,
            fields,
        })
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

fn patch(op: &mut Op, slot: Slot, ofs: i32) -> Result<()> {
    match (op, slot) {
        (Op::Goto(o) | Op::If(_, o) | Op::IfICmp(_, o), Slot::Branch) => *o = ofs,
        (Op::TableSwitch { default, .. } | Op::LookupSwitch { default, .. }, Slot::SwitchDefault) => *default = ofs,
        (Op::TableSwitch { offsets, .. }, Slot::SwitchArm(n)) => {
            *offsets.get_mut(n).ok_or_else(|| anyhow!("table arm {} out of range", n))? = ofs
        }
        (Op::LookupSwitch { pairs, .. }, Slot::SwitchArm(n)) => {
            pairs.get_mut(n).ok_or_else(|| anyhow!("lookup arm {} out of range", n))?.1 = ofs
        }
        (op, slot) => bail!("cannot patch {:?} into {}", slot, op),
    }
    Ok(())
}

impl Emitter for Assembler {
    fn create_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    fn add_label(&mut self, label: Label) {
        let pos = self.ops.len();
        match self.labels.get_mut(label.0 as usize) {
            Some(slot @ None) => *slot = Some(pos),
            Some(Some(_)) => self.binding_errors.push(format!("label {} bound more than once", label)),
            None => self
                .binding_errors
                .push(format!("label {} was never created", label)),
        }
    }

    fn add(&mut self, op: Op) {
        self.ops.push(op);
    }

    fn add_inc(&mut self, slot: u16, delta: i32) {
        self.ops.push(Op::Inc { slot, delta });
    }

    fn add_branch(&mut self, branch: Branch, target: Label) {
        self.push_fixup(Slot::Branch, target);
        let op = match branch {
            Branch::Goto => Op::Goto(0),
            Branch::If(cond) => Op::If(cond, 0),
            Branch::IfICmp(cond) => Op::IfICmp(cond, 0),
        };
        self.ops.push(op);
    }

    fn add_table_switch(&mut self, keys: &[i32], labels: &[Label], default: Label) {
        let mut arms: Vec<(i32, Label)> = keys.iter().copied().zip(labels.iter().copied()).collect();
        arms.sort_by_key(|(key, _)| *key);
        arms.dedup_by_key(|(key, _)| *key);

        self.push_fixup(Slot::SwitchDefault, default);
        let (Some(&(low, _)), Some(&(high, _))) = (arms.first(), arms.last()) else {
            self.ops.push(Op::LookupSwitch {
                default: 0,
                pairs: Vec::new(),
            });
            return;
        };

        let range = high as i64 - low as i64 + 1;
        let density = arms.len() as f64 / range as f64;
        if range <= MAX_TABLE_LEN && density >= self.min_table_density {
            let mut table = vec![default; range as usize];
            for (key, label) in &arms {
                table[(*key as i64 - low as i64) as usize] = *label;
            }
            for (n, label) in table.iter().enumerate() {
                self.push_fixup(Slot::SwitchArm(n), *label);
            }
            self.ops.push(Op::TableSwitch {
                low,
                default: 0,
                offsets: vec![0; table.len()],
            });
        } else {
            for (n, (_, label)) in arms.iter().enumerate() {
                self.push_fixup(Slot::SwitchArm(n), *label);
            }
            self.ops.push(Op::LookupSwitch {
                default: 0,
                pairs: arms.iter().map(|(key, _)| (*key, 0)).collect(),
            });
        }
    }
}

/// Abstract interpretation of stack depth over every reachable path.
/// Returns the maximum depth reached.
pub fn verify_stack(ops: &[Op]) -> Result<u16> {
    let mut depth_at: Vec<Option<u32>> = vec![None; ops.len()];
    let mut work = Vec::new();
    let mut max_depth = 0u32;
    if !ops.is_empty() {
        depth_at[0] = Some(0);
        work.push(0usize);
    }

    while let Some(pc) = work.pop() {
        let op = &ops[pc];
        let depth = depth_at[pc].unwrap_or(0);
        let (pops, pushes) = op.stack_effect();
        if depth < pops {
            bail!("stack underflow at {}: {} needs {} value(s), found {}", pc, op, pops, depth);
        }
        let after = depth - pops + pushes;
        max_depth = max_depth.max(depth.max(after));

        let mut successors: Vec<usize> = Vec::new();
        for ofs in op.branch_offsets() {
            let target = pc as i64 + ofs as i64;
            if target < 0 || target >= ops.len() as i64 {
                bail!("branch at {} targets {} outside the code", pc, target);
            }
            successors.push(target as usize);
        }
        if op.falls_through() {
            if pc + 1 >= ops.len() {
                bail!("control falls off the end after {}", pc);
            }
            successors.push(pc + 1);
        }

        for next in successors {
            match depth_at[next] {
                Some(seen) if seen != after => {
                    bail!("inconsistent stack depth at {}: {} vs {}", next, seen, after)
                }
                Some(_) => {}
                None => {
                    depth_at[next] = Some(after);
                    work.push(next);
                }
            }
        }
    }

    u16::try_from(max_depth).context("stack depth exceeds u16")
}
