//! Concrete constant values shared by the front-end and the backends.

pub mod value;

pub use value::Value;
