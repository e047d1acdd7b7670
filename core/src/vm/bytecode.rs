use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::FieldDecl;
use crate::typ::NumericKind;

/// Symbolic branch target handed out by the emitter. Bound to exactly one
/// program point, referenced any number of times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Comparison against zero (`If`) or between two ints (`IfICmp`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

impl Cond {
    /// The condition that holds exactly when `self` does not.
    pub fn negate(self) -> Cond {
        match self {
            Cond::Eq => Cond::Ne,
            Cond::Ne => Cond::Eq,
            Cond::Lt => Cond::Ge,
            Cond::Ge => Cond::Lt,
            Cond::Gt => Cond::Le,
            Cond::Le => Cond::Gt,
        }
    }

    pub fn test(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Cond::Eq => lhs == rhs,
            Cond::Ne => lhs != rhs,
            Cond::Lt => lhs < rhs,
            Cond::Ge => lhs >= rhs,
            Cond::Gt => lhs > rhs,
            Cond::Le => lhs <= rhs,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Ge => "ge",
            Cond::Gt => "gt",
            Cond::Le => "le",
        }
    }
}

/// Branch shapes the code generator asks the emitter for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Goto,
    If(Cond),
    IfICmp(Cond),
}

/// Stack machine instruction. Every value takes one stack slot and one local
/// slot regardless of its kind.
///
/// Branch operands are offsets relative to the branching instruction, patched
/// in by the assembler once labels are bound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    IConst(i32),
    LConst(i64),
    DConst(f64),

    Load(NumericKind, u16),
    Store(NumericKind, u16),
    /// In-place add of `delta` to a local, keeping its kind.
    Inc {
        slot: u16,
        delta: i32,
    },

    /// Push the receiver.
    LoadThis,
    /// `obj -> value`
    GetField(u16),
    /// `obj, value ->`
    PutField(u16),

    Dup,
    /// `v2, v1 -> v1, v2, v1`
    DupX1,
    Pop,

    Add(NumericKind),
    Sub(NumericKind),
    Mul(NumericKind),
    Div(NumericKind),
    Rem(NumericKind),
    Neg(NumericKind),

    LCmp,
    /// Double compare; NaN yields -1.
    DCmpL,
    /// Double compare; NaN yields 1.
    DCmpG,

    Goto(i32),
    If(Cond, i32),
    IfICmp(Cond, i32),
    /// Dense dispatch over `low..low + offsets.len()`.
    TableSwitch {
        low: i32,
        default: i32,
        offsets: Vec<i32>,
    },
    /// Sparse dispatch over sorted `(key, offset)` pairs.
    LookupSwitch {
        default: i32,
        pairs: Vec<(i32, i32)>,
    },

    Return,
    ReturnValue(NumericKind),
}

impl Op {
    /// Values popped and pushed, in single-slot units.
    pub fn stack_effect(&self) -> (u32, u32) {
        match self {
            Op::IConst(_) | Op::LConst(_) | Op::DConst(_) | Op::Load(..) | Op::LoadThis => (0, 1),
            Op::Store(..) | Op::Pop | Op::If(..) | Op::ReturnValue(_) => (1, 0),
            Op::TableSwitch { .. } | Op::LookupSwitch { .. } => (1, 0),
            Op::Inc { .. } | Op::Goto(_) | Op::Return => (0, 0),
            Op::GetField(_) | Op::Neg(_) => (1, 1),
            Op::PutField(_) | Op::IfICmp(..) => (2, 0),
            Op::Dup => (1, 2),
            Op::DupX1 => (2, 3),
            Op::Add(_) | Op::Sub(_) | Op::Mul(_) | Op::Div(_) | Op::Rem(_) => (2, 1),
            Op::LCmp | Op::DCmpL | Op::DCmpG => (2, 1),
        }
    }

    /// Whether execution may continue with the next instruction.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            Op::Goto(_) | Op::TableSwitch { .. } | Op::LookupSwitch { .. } | Op::Return | Op::ReturnValue(_)
        )
    }

    /// Relative branch offsets carried by this instruction.
    pub fn branch_offsets(&self) -> Vec<i32> {
        match self {
            Op::Goto(ofs) | Op::If(_, ofs) | Op::IfICmp(_, ofs) => vec![*ofs],
            Op::TableSwitch { default, offsets, .. } => {
                std::iter::once(*default).chain(offsets.iter().copied()).collect()
            }
            Op::LookupSwitch { default, pairs } => {
                std::iter::once(*default).chain(pairs.iter().map(|(_, ofs)| *ofs)).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_branch(&self) -> bool {
        !self.branch_offsets().is_empty()
    }

    /// Renders the instruction. With `pc`, branch targets are shown as
    /// absolute indices instead of relative offsets.
    pub fn render(&self, pc: Option<usize>) -> String {
        let target = |ofs: i32| match pc {
            Some(pc) => format!("{}", pc as i64 + ofs as i64),
            None => format!("{:+}", ofs),
        };
        match self {
            Op::IConst(v) => format!("iconst {}", v),
            Op::LConst(v) => format!("lconst {}", v),
            Op::DConst(v) => format!("dconst {:?}", v),
            Op::Load(kind, slot) => format!("{}load {}", kind.prefix(), slot),
            Op::Store(kind, slot) => format!("{}store {}", kind.prefix(), slot),
            Op::Inc { slot, delta } => format!("inc {} {}", slot, delta),
            Op::LoadThis => "load_this".to_string(),
            Op::GetField(idx) => format!("getfield {}", idx),
            Op::PutField(idx) => format!("putfield {}", idx),
            Op::Dup => "dup".to_string(),
            Op::DupX1 => "dup_x1".to_string(),
            Op::Pop => "pop".to_string(),
            Op::Add(kind) => format!("{}add", kind.prefix()),
            Op::Sub(kind) => format!("{}sub", kind.prefix()),
            Op::Mul(kind) => format!("{}mul", kind.prefix()),
            Op::Div(kind) => format!("{}div", kind.prefix()),
            Op::Rem(kind) => format!("{}rem", kind.prefix()),
            Op::Neg(kind) => format!("{}neg", kind.prefix()),
            Op::LCmp => "lcmp".to_string(),
            Op::DCmpL => "dcmpl".to_string(),
            Op::DCmpG => "dcmpg".to_string(),
            Op::Goto(ofs) => format!("goto {}", target(*ofs)),
            Op::If(cond, ofs) => format!("if{} {}", cond.mnemonic(), target(*ofs)),
            Op::IfICmp(cond, ofs) => format!("if_icmp{} {}", cond.mnemonic(), target(*ofs)),
            Op::TableSwitch { low, default, offsets } => {
                let arms: Vec<String> = offsets
                    .iter()
                    .enumerate()
                    .map(|(i, ofs)| format!("{}: {}", *low as i64 + i as i64, target(*ofs)))
                    .collect();
                format!("tableswitch {{ {}, default: {} }}", arms.join(", "), target(*default))
            }
            Op::LookupSwitch { default, pairs } => {
                let arms: Vec<String> = pairs
                    .iter()
                    .map(|(key, ofs)| format!("{}: {}", key, target(*ofs)))
                    .collect();
                if arms.is_empty() {
                    format!("lookupswitch {{ default: {} }}", target(*default))
                } else {
                    format!("lookupswitch {{ {}, default: {} }}", arms.join(", "), target(*default))
                }
            }
            Op::Return => "return".to_string(),
            Op::ReturnValue(kind) => format!("{}return", kind.prefix()),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Assembled code for one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodeUnit {
    pub name: String,
    pub ops: Vec<Op>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub fields: Vec<FieldDecl>,
}

impl CodeUnit {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl fmt::Display for CodeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "unit {} (max_stack={}, max_locals={})",
            self.name, self.max_stack, self.max_locals
        )?;
        for (idx, field) in self.fields.iter().enumerate() {
            writeln!(f, "  field {}: {} {}", idx, field.ty, field.name)?;
        }
        for (pc, op) in self.ops.iter().enumerate() {
            writeln!(f, "{:>4}: {}", pc, op.render(Some(pc)))?;
        }
        Ok(())
    }
}
