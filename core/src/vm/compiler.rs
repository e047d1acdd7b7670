mod builder;
mod driver;
mod expr;
mod lvalue;
mod options;
mod stmt;

pub use builder::{CodeGen, Emitter, JumpLabels, Usage};
pub use driver::Compiler;
pub use lvalue::Location;
pub use options::{CompileOptions, SwitchOptions, VmOptions};

#[cfg(test)]
mod tests;
