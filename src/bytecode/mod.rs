//! Bytecode backend: a flat instruction stream for the interpreter.

pub mod builder;
pub mod disasm;
pub mod ir;
pub mod op;

pub use builder::Builder;
pub use ir::{Code, FuncEntry, StmtSpan};
pub use op::{Op, VarRef};
