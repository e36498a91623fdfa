use miette::Diagnostic;
use thiserror::Error;

use crate::exec::builtin::EvalError;
use crate::exec::kind::Kind;
use crate::exec::operator::Operator;
use crate::exec::types::Type;
use crate::lang::value::{ReprError, Value};

/// A user-facing compile error.
///
/// These describe mistakes in the program being compiled. They are returned,
/// never raised, so the diagnostic layer can collect several per compilation
/// unit. Defects in the compiler itself go through [`internal_error`] instead.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum CompileError {
    #[error("invalid operation: operator {op} not defined on {kind}")]
    #[diagnostic(code(cl::invalid_operand))]
    InvalidOperand { op: Operator, kind: Kind },

    #[error("cannot use {found} value as {expected} value")]
    #[diagnostic(
        code(cl::type_mismatch),
        help("add an explicit conversion to {expected}")
    )]
    TypeMismatch { expected: String, found: String },

    #[error("mismatched types in composite literal: elements have no common type")]
    #[diagnostic(
        code(cl::mismatched_elements),
        help("convert the elements to one type or declare the literal's element type")
    )]
    MismatchedElements,

    #[error("multiple-value ({count} values) in single-value context")]
    #[diagnostic(code(cl::multiple_values))]
    MultipleValues { count: usize },

    #[error("expression is not a value")]
    #[diagnostic(code(cl::not_a_value), help("packages and types cannot be used as values"))]
    NotAValue,

    #[error("constant {value} overflows {ty}")]
    #[diagnostic(code(cl::overflow))]
    Overflow { value: String, ty: String },

    #[error("constant {value} truncated to {ty}")]
    #[diagnostic(code(cl::truncated))]
    Truncated { value: String, ty: String },

    #[error("cannot convert constant {value} to {ty}")]
    #[diagnostic(code(cl::invalid_conversion))]
    InvalidConversion { value: String, ty: String },

    #[error("invalid shift count")]
    #[diagnostic(code(cl::invalid_shift))]
    InvalidShift,

    #[error("division by zero")]
    #[diagnostic(code(cl::division_by_zero))]
    DivisionByZero,
}

impl CompileError {
    /// Binding a value of `found` where `expected` is required.
    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        CompileError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Failure to represent constant `value` in `ty`.
    pub fn from_repr(err: ReprError, value: &Value, ty: &Type) -> Self {
        let value = value.literal();
        let ty = ty.to_string();
        match err {
            ReprError::Overflow => CompileError::Overflow { value, ty },
            ReprError::Truncated => CompileError::Truncated { value, ty },
            ReprError::Incompatible => CompileError::InvalidConversion { value, ty },
        }
    }

    /// Failure of constant arithmetic on operands of `kind`.
    pub fn from_eval(err: EvalError, op: Operator, kind: Kind) -> Self {
        match err {
            EvalError::DivisionByZero => CompileError::DivisionByZero,
            EvalError::InvalidShift => CompileError::InvalidShift,
            EvalError::Overflow => CompileError::Overflow {
                value: format!("result of `{}`", op),
                ty: kind.to_string(),
            },
        }
    }
}

/// Abort compilation because an internal invariant was violated.
///
/// Reaching this is a defect in the front-end or a backend, never a problem with
/// the program being compiled.
#[track_caller]
pub fn internal_error(msg: impl Into<String>) -> ! {
    let msg = msg.into();
    tracing::error!(invariant = %msg, "internal compiler error");
    panic!("internal compiler error: {}", msg)
}

/// Accumulates the user-facing errors of one compilation unit.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<CompileError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, err: CompileError) {
        tracing::debug!(code = ?err.code().map(|c| c.to_string()), "{}", err);
        self.errors.push(err);
    }

    /// Record the error of `result`, passing its value through.
    pub fn check<T>(&mut self, result: Result<T, CompileError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.emit(e);
                None
            }
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    pub fn finish(self) -> Result<(), Vec<CompileError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operand_display() {
        let err = CompileError::InvalidOperand {
            op: Operator::Mod,
            kind: Kind::Float64,
        };

        let msg = err.to_string();
        assert!(msg.contains("%"));
        assert!(msg.contains("float64"));
    }

    #[test]
    fn test_type_mismatch_display_and_help() {
        let err = CompileError::type_mismatch(Type::int8(), Kind::String);

        assert_eq!(err.to_string(), "cannot use string value as int8 value");
        let help = err.help().map(|h| h.to_string());
        assert_eq!(help.as_deref(), Some("add an explicit conversion to int8"));
    }

    #[test]
    fn test_error_codes() {
        let code = CompileError::MismatchedElements.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("cl::mismatched_elements"));
    }

    #[test]
    fn test_from_repr() {
        let err = CompileError::from_repr(ReprError::Overflow, &Value::Int(300), &Type::int8());
        assert_eq!(err.to_string(), "constant 300 overflows int8");

        let err = CompileError::from_repr(ReprError::Truncated, &Value::Float64(2.5), &Type::int());
        assert_eq!(err.to_string(), "constant 2.5 truncated to int");

        let err = CompileError::from_repr(
            ReprError::Incompatible,
            &Value::String("s".into()),
            &Type::float64(),
        );
        assert!(matches!(err, CompileError::InvalidConversion { .. }));
    }

    #[test]
    fn test_from_eval() {
        let err = CompileError::from_eval(EvalError::Overflow, Operator::Mul, Kind::Int8);
        assert!(err.to_string().contains("overflows int8"));
        assert_eq!(
            CompileError::from_eval(EvalError::DivisionByZero, Operator::Quo, Kind::Int),
            CompileError::DivisionByZero
        );
    }

    #[test]
    fn test_multiple_values_display() {
        let err = CompileError::MultipleValues { count: 2 };
        assert!(err.to_string().contains("2 values"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = CompileError::NotAValue;
        let _: &dyn std::error::Error = &err;
    }

    #[test]
    fn test_diagnostics_collects_many() {
        let mut diags = Diagnostics::new();
        assert!(diags.check(Ok::<_, CompileError>(1)).is_some());
        assert!(diags.check::<()>(Err(CompileError::DivisionByZero)).is_none());
        diags.emit(CompileError::NotAValue);

        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
        let errors = diags.finish().unwrap_err();
        assert_eq!(errors[0], CompileError::DivisionByZero);
        assert_eq!(errors[1], CompileError::NotAValue);
    }

    #[test]
    fn test_empty_diagnostics_finish_ok() {
        assert!(Diagnostics::new().finish().is_ok());
    }

    #[test]
    #[should_panic(expected = "internal compiler error: broken invariant")]
    fn test_internal_error_panics() {
        internal_error("broken invariant");
    }
}
