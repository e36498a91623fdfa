//! Compile-time core of a Go+ compiler.
//!
//! [`cl`] models the values an expression compiler juggles (typed and
//! untyped constants, runtime values, packages, calls) and folds constant
//! expressions. Code generation goes through the [`exec::Builder`] contract,
//! implemented by the [`bytecode`] interpreter backend and the [`golang`]
//! source backend.

pub mod bytecode;
pub mod cl;
pub mod exec;
pub mod golang;
pub mod lang;
