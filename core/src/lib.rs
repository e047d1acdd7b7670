pub mod ast;
pub mod typ;
pub mod vm;

pub use vm::{CodeUnit, CompileOptions, Compiler};
