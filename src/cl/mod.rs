//! Compile-time values: operands, constant folding and binding.

pub mod compile_error;
pub mod constant;
pub mod operand;

pub use compile_error::{CompileError, Diagnostics, internal_error};
pub use constant::{ConstVal, binary_op, bound_element_type, const_is_convertible, unary_op};
pub use operand::{FuncResults, GoFunc, GoValue, NonValue, Operand, QlFunc, bound_type, is_bool, new_func_results};
