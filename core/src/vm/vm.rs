use std::fmt;

use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use tracing::trace;

use super::bytecode::{CodeUnit, Op};
use super::compiler::VmOptions;
use crate::typ::{NumericKind, Type};

/// Runtime value; the receiver is the only reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Int(i32),
    Long(i64),
    Double(f64),
    Ref,
}

impl Value {
    fn zero(ty: Type) -> Value {
        match ty.storage_kind() {
            NumericKind::Int => Value::Int(0),
            NumericKind::Long => Value::Long(0),
            NumericKind::Double => Value::Double(0.0),
        }
    }

    fn kind(self) -> Option<NumericKind> {
        match self {
            Value::Int(_) => Some(NumericKind::Int),
            Value::Long(_) => Some(NumericKind::Long),
            Value::Double(_) => Some(NumericKind::Double),
            Value::Ref => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Double(v) => write!(f, "{:?}", v),
            Value::Ref => write!(f, "this"),
        }
    }
}

/// Observable state at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// Value of `return expr`, `None` for a bare return.
    pub value: Option<Value>,
    pub locals: Vec<Option<Value>>,
    pub fields: Vec<(String, Value)>,
    pub steps: u64,
    pub max_depth: usize,
    /// Values still on the stack when the unit returned.
    pub stack_left: usize,
}

impl Outcome {
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.iter().find(|(field, _)| field == name).map(|(_, value)| *value)
    }

    pub fn local(&self, slot: u16) -> Option<Value> {
        self.locals.get(slot as usize).copied().flatten()
    }
}

/// Reference interpreter for [`CodeUnit`]s.
#[derive(Debug, Clone)]
pub struct Vm {
    max_steps: u64,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new(VmOptions::default().max_steps)
    }
}

struct Frame<'c> {
    code: &'c CodeUnit,
    stack: Vec<Value>,
    locals: Vec<Option<Value>>,
    fields: Vec<Value>,
    max_depth: usize,
}

impl Vm {
    pub fn new(max_steps: u64) -> Self {
        Self { max_steps }
    }

    pub fn from_options(options: &VmOptions) -> Self {
        Self::new(options.max_steps)
    }

    pub fn run(&self, code: &CodeUnit) -> Result<Outcome> {
        let mut locals = vec![None; usize::from(code.max_locals.max(1))];
        locals[0] = Some(Value::Ref);
        let mut frame = Frame {
            code,
            stack: Vec::with_capacity(usize::from(code.max_stack)),
            locals,
            fields: code.fields.iter().map(|field| Value::zero(field.ty)).collect(),
            max_depth: 0,
        };

        let mut pc = 0usize;
        let mut steps = 0u64;
        let value = loop {
            if steps >= self.max_steps {
                bail!("instruction budget of {} exhausted in {}", self.max_steps, code.name);
            }
            steps += 1;
            let op = code
                .ops
                .get(pc)
                .ok_or_else(|| anyhow!("pc {} outside of {} ({} ops)", pc, code.name, code.ops.len()))?;
            trace!(pc, %op, depth = frame.stack.len(), "step");
            match frame.step(op)? {
                Flow::Next => pc += 1,
                Flow::Jump(ofs) => pc = jump(pc, ofs)?,
                Flow::Return(value) => break value,
            }
        };

        Ok(Outcome {
            value,
            locals: frame.locals,
            fields: code
                .fields
                .iter()
                .map(|field| field.name.clone())
                .zip(frame.fields)
                .collect(),
            steps,
            max_depth: frame.max_depth,
            stack_left: frame.stack.len(),
        })
    }
}

enum Flow {
    Next,
    Jump(i32),
    Return(Option<Value>),
}

fn jump(pc: usize, ofs: i32) -> Result<usize> {
    let target = pc as i64 + ofs as i64;
    usize::try_from(target).map_err(|_| anyhow!("jump from {} to negative target {}", pc, target))
}

impl Frame<'_> {
    fn push(&mut self, value: Value) {
        self.stack.push(value);
        self.max_depth = self.max_depth.max(self.stack.len());
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or_else(|| anyhow!("stack underflow"))
    }

    fn pop_kind(&mut self, kind: NumericKind) -> Result<Value> {
        let value = self.pop()?;
        if value.kind() != Some(kind) {
            bail!("expected {} on the stack, found {:?}", kind, value);
        }
        Ok(value)
    }

    fn pop_int(&mut self) -> Result<i32> {
        match self.pop()? {
            Value::Int(v) => Ok(v),
            other => bail!("expected int on the stack, found {:?}", other),
        }
    }

    fn pop_ref(&mut self) -> Result<()> {
        match self.pop()? {
            Value::Ref => Ok(()),
            other => bail!("expected the receiver on the stack, found {:?}", other),
        }
    }

    fn local(&self, slot: u16) -> Result<Value> {
        self.locals
            .get(usize::from(slot))
            .copied()
            .flatten()
            .ok_or_else(|| anyhow!("read of uninitialized local {}", slot))
    }

    fn local_mut(&mut self, slot: u16) -> Result<&mut Option<Value>> {
        let len = self.locals.len();
        self.locals
            .get_mut(usize::from(slot))
            .ok_or_else(|| anyhow!("local {} out of range ({} slots)", slot, len))
    }

    fn field_index(&self, index: u16) -> Result<usize> {
        let index = usize::from(index);
        if index >= self.fields.len() {
            bail!("field {} out of range in {}", index, self.code.name);
        }
        Ok(index)
    }

    fn step(&mut self, op: &Op) -> Result<Flow> {
        match op {
            Op::IConst(v) => self.push(Value::Int(*v)),
            Op::LConst(v) => self.push(Value::Long(*v)),
            Op::DConst(v) => self.push(Value::Double(*v)),
            Op::Load(kind, slot) => {
                let value = self.local(*slot)?;
                if value.kind() != Some(*kind) {
                    bail!("local {} holds {:?}, not {}", slot, value, kind);
                }
                self.push(value);
            }
            Op::Store(kind, slot) => {
                let value = self.pop_kind(*kind)?;
                *self.local_mut(*slot)? = Some(value);
            }
            Op::Inc { slot, delta } => {
                let value = self.local(*slot)?;
                let bumped = match value {
                    Value::Int(v) => Value::Int(v.wrapping_add(*delta)),
                    Value::Long(v) => Value::Long(v.wrapping_add(i64::from(*delta))),
                    Value::Double(v) => Value::Double(v + f64::from(*delta)),
                    Value::Ref => bail!("inc on the receiver slot {}", slot),
                };
                *self.local_mut(*slot)? = Some(bumped);
            }
            Op::LoadThis => self.push(Value::Ref),
            Op::GetField(index) => {
                let index = self.field_index(*index)?;
                self.pop_ref()?;
                self.push(self.fields[index]);
            }
            Op::PutField(index) => {
                let index = self.field_index(*index)?;
                let value = self.pop()?;
                self.pop_ref()?;
                self.fields[index] = value;
            }
            Op::Dup => {
                let top = *self.stack.last().ok_or_else(|| anyhow!("dup on an empty stack"))?;
                self.push(top);
            }
            Op::DupX1 => {
                let v1 = self.pop()?;
                let v2 = self.pop()?;
                self.push(v1);
                self.push(v2);
                self.push(v1);
            }
            Op::Pop => {
                self.pop()?;
            }
            Op::Add(kind) | Op::Sub(kind) | Op::Mul(kind) | Op::Div(kind) | Op::Rem(kind) => {
                let rhs = self.pop_kind(*kind)?;
                let lhs = self.pop_kind(*kind)?;
                self.push(arith(op, lhs, rhs)?);
            }
            Op::Neg(kind) => {
                let value = match self.pop_kind(*kind)? {
                    Value::Int(v) => Value::Int(v.wrapping_neg()),
                    Value::Long(v) => Value::Long(v.wrapping_neg()),
                    Value::Double(v) => Value::Double(-v),
                    Value::Ref => bail!("cannot negate the receiver"),
                };
                self.push(value);
            }
            Op::LCmp => {
                let (Value::Long(rhs), Value::Long(lhs)) = (self.pop()?, self.pop()?) else {
                    bail!("lcmp expects two longs");
                };
                self.push(Value::Int(lhs.cmp(&rhs) as i32));
            }
            Op::DCmpL | Op::DCmpG => {
                let (Value::Double(rhs), Value::Double(lhs)) = (self.pop()?, self.pop()?) else {
                    bail!("{} expects two doubles", op);
                };
                let result = match lhs.partial_cmp(&rhs) {
                    Some(ordering) => ordering as i32,
                    None if matches!(op, Op::DCmpG) => 1,
                    None => -1,
                };
                self.push(Value::Int(result));
            }
            Op::Goto(ofs) => return Ok(Flow::Jump(*ofs)),
            Op::If(cond, ofs) => {
                let value = self.pop_int()?;
                if cond.test(value, 0) {
                    return Ok(Flow::Jump(*ofs));
                }
            }
            Op::IfICmp(cond, ofs) => {
                let rhs = self.pop_int()?;
                let lhs = self.pop_int()?;
                if cond.test(lhs, rhs) {
                    return Ok(Flow::Jump(*ofs));
                }
            }
            Op::TableSwitch { low, default, offsets } => {
                let key = self.pop_int()?;
                let index = i64::from(key) - i64::from(*low);
                let ofs = usize::try_from(index)
                    .ok()
                    .and_then(|index| offsets.get(index))
                    .copied()
                    .unwrap_or(*default);
                return Ok(Flow::Jump(ofs));
            }
            Op::LookupSwitch { default, pairs } => {
                let key = self.pop_int()?;
                let ofs = pairs
                    .binary_search_by_key(&key, |(k, _)| *k)
                    .map(|found| pairs[found].1)
                    .unwrap_or(*default);
                return Ok(Flow::Jump(ofs));
            }
            Op::Return => return Ok(Flow::Return(None)),
            Op::ReturnValue(kind) => {
                let value = self.pop_kind(*kind)?;
                return Ok(Flow::Return(Some(value)));
            }
        }
        Ok(Flow::Next)
    }
}

fn arith(op: &Op, lhs: Value, rhs: Value) -> Result<Value> {
    Ok(match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Value::Int(match op {
            Op::Add(_) => a.wrapping_add(b),
            Op::Sub(_) => a.wrapping_sub(b),
            Op::Mul(_) => a.wrapping_mul(b),
            Op::Div(_) | Op::Rem(_) if b == 0 => bail!("division by zero"),
            Op::Div(_) => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        }),
        (Value::Long(a), Value::Long(b)) => Value::Long(match op {
            Op::Add(_) => a.wrapping_add(b),
            Op::Sub(_) => a.wrapping_sub(b),
            Op::Mul(_) => a.wrapping_mul(b),
            Op::Div(_) | Op::Rem(_) if b == 0 => bail!("division by zero"),
            Op::Div(_) => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        }),
        (Value::Double(a), Value::Double(b)) => Value::Double(match op {
            Op::Add(_) => a + b,
            Op::Sub(_) => a - b,
            Op::Mul(_) => a * b,
            Op::Div(_) => a / b,
            _ => a % b,
        }),
        (lhs, rhs) => bail!("mismatched operands {:?} and {:?} for {}", lhs, rhs, op),
    })
}
