//! Kinds, operators, runtime types and the backend contract.

pub mod builtin;
pub mod kind;
pub mod operator;
pub mod registry;
pub mod spec;
pub mod types;

pub use kind::Kind;
pub use operator::{AddrOperator, GoBuiltin, Operator};
pub use registry::Registry;
pub use spec::*;
pub use types::Type;
