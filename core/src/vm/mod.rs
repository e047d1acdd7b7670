//! Stack VM subsystem
//!
//! Instruction set, the assembler that plays the role of the instruction
//! emitter, the code generator that lowers checked trees, and a reference
//! interpreter used to execute the result.

mod assembler;
mod bytecode;
mod compiler;
#[allow(clippy::module_inception)]
mod vm;

pub use assembler::{Assembler, verify_stack};
pub use bytecode::*;
pub use compiler::*;
pub use vm::*;

#[cfg(test)]
mod vm_test;
