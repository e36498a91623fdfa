//! Native semantics of the built-in operators over concrete values.
//!
//! Constant folding converts its operands to one concrete kind and then calls
//! [`call_builtin_op`]. Arithmetic follows the rules for typed constants:
//! results must fit the operand kind, and division by zero is rejected.

use num_complex::Complex64;

use crate::cl::internal_error;
use crate::exec::kind::Kind;
use crate::exec::operator::Operator;
use crate::lang::value::Value;

/// Failure of a constant operation on well-kinded operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    DivisionByZero,
    /// The exact result does not fit the operand kind.
    Overflow,
    /// Negative or oversized shift count.
    InvalidShift,
}

/// Apply `op` to operands that are all of `kind`. The count of a shift may
/// be of any integer kind.
///
/// Operand count and operand kinds are the caller's responsibility; a mismatch
/// is an internal compiler error.
pub fn call_builtin_op(kind: Kind, op: Operator, args: &[Value]) -> Result<Value, EvalError> {
    let arity = if op.is_unary() { 1 } else { 2 };
    if args.len() != arity {
        internal_error(format!(
            "call_builtin_op: operator `{}` expects {} operand(s), got {}",
            op,
            arity,
            args.len()
        ));
    }
    let well_kinded = |(i, v): &(usize, &Value)| {
        if op.is_shift() && *i == 1 {
            v.kind().is_integer()
        } else {
            v.kind() == kind
        }
    };
    if let Some((_, bad)) = args.iter().enumerate().find(|a| !well_kinded(a)) {
        internal_error(format!(
            "call_builtin_op: operand of kind {} passed as {}",
            bad.kind(),
            kind
        ));
    }
    if !op.info().accepts_first(kind) {
        internal_error(format!("call_builtin_op: operator `{}` on {}", op, kind));
    }

    match kind {
        Kind::Bool => bool_op(op, args),
        Kind::String => string_op(op, args),
        k if k.is_integer() => int_op(k, op, args),
        k if k.is_float() => float_op(k, op, args),
        k if k.is_complex() => complex_op(k, op, args),
        k => internal_error(format!("call_builtin_op: unsupported kind {}", k)),
    }
}

fn operand<T>(args: &[Value], i: usize, get: impl Fn(&Value) -> Option<T>) -> T {
    match get(&args[i]) {
        Some(v) => v,
        None => internal_error(format!("call_builtin_op: malformed operand {:?}", args[i])),
    }
}

fn bool_op(op: Operator, args: &[Value]) -> Result<Value, EvalError> {
    let x = operand(args, 0, Value::as_bool);
    if op == Operator::Not {
        return Ok(Value::Bool(!x));
    }
    let y = operand(args, 1, Value::as_bool);
    Ok(Value::Bool(match op {
        Operator::LAnd => x && y,
        Operator::LOr => x || y,
        Operator::EQ => x == y,
        Operator::NE => x != y,
        _ => unreachable!("operator table admits no other bool operator"),
    }))
}

fn string_op(op: Operator, args: &[Value]) -> Result<Value, EvalError> {
    let x = operand(args, 0, |v| v.as_str().map(str::to_string));
    let y = operand(args, 1, |v| v.as_str().map(str::to_string));
    Ok(match op {
        Operator::Add => Value::String(x + &y),
        Operator::EQ => Value::Bool(x == y),
        Operator::NE => Value::Bool(x != y),
        Operator::LT => Value::Bool(x < y),
        Operator::LE => Value::Bool(x <= y),
        Operator::GT => Value::Bool(x > y),
        Operator::GE => Value::Bool(x >= y),
        _ => unreachable!("operator table admits no other string operator"),
    })
}

fn int_op(kind: Kind, op: Operator, args: &[Value]) -> Result<Value, EvalError> {
    let x = operand(args, 0, Value::as_i128);
    let wrap = |v: Option<i128>| -> Result<Value, EvalError> {
        v.and_then(|v| Value::from_i128(kind, v)).ok_or(EvalError::Overflow)
    };

    if op.is_unary() {
        return match op {
            Operator::Neg => wrap(x.checked_neg()),
            Operator::BitNot if kind.is_unsigned_int() => wrap(Some(unsigned_max(kind) - x)),
            Operator::BitNot => wrap(Some(!x)),
            _ => unreachable!("operator table admits no other unary integer operator"),
        };
    }

    let y = operand(args, 1, Value::as_i128);
    match op {
        Operator::Add => wrap(x.checked_add(y)),
        Operator::Sub => wrap(x.checked_sub(y)),
        Operator::Mul => wrap(x.checked_mul(y)),
        Operator::Quo | Operator::Mod if y == 0 => Err(EvalError::DivisionByZero),
        Operator::Quo => wrap(x.checked_div(y)),
        Operator::Mod => wrap(x.checked_rem(y)),
        Operator::And => wrap(Some(x & y)),
        Operator::Or => wrap(Some(x | y)),
        Operator::Xor => wrap(Some(x ^ y)),
        Operator::AndNot => wrap(Some(x & !y)),
        Operator::Lsh => {
            let n = shift_count(y)?;
            if x == 0 {
                return wrap(Some(0));
            }
            if n >= 127 {
                return Err(EvalError::Overflow);
            }
            let r = x << n;
            if r >> n != x {
                return Err(EvalError::Overflow);
            }
            wrap(Some(r))
        }
        Operator::Rsh => {
            let n = shift_count(y)?;
            wrap(Some(if n >= 127 { if x < 0 { -1 } else { 0 } } else { x >> n }))
        }
        Operator::EQ => Ok(Value::Bool(x == y)),
        Operator::NE => Ok(Value::Bool(x != y)),
        Operator::LT => Ok(Value::Bool(x < y)),
        Operator::LE => Ok(Value::Bool(x <= y)),
        Operator::GT => Ok(Value::Bool(x > y)),
        Operator::GE => Ok(Value::Bool(x >= y)),
        _ => unreachable!("operator table admits no other integer operator"),
    }
}

fn unsigned_max(kind: Kind) -> i128 {
    match kind {
        Kind::Uint8 => u8::MAX as i128,
        Kind::Uint16 => u16::MAX as i128,
        Kind::Uint32 => u32::MAX as i128,
        _ => u64::MAX as i128,
    }
}

fn shift_count(y: i128) -> Result<u32, EvalError> {
    if y < 0 {
        return Err(EvalError::InvalidShift);
    }
    Ok(u32::try_from(y).unwrap_or(u32::MAX))
}

fn float_op(kind: Kind, op: Operator, args: &[Value]) -> Result<Value, EvalError> {
    let x = operand(args, 0, Value::as_f64);
    let wrap = |v: f64| -> Result<Value, EvalError> {
        match Value::from_f64(kind, v) {
            Some(value) if !is_overflowed(&value) => Ok(value),
            _ => Err(EvalError::Overflow),
        }
    };

    if op == Operator::Neg {
        return wrap(-x);
    }

    let y = operand(args, 1, Value::as_f64);
    match op {
        Operator::Add => wrap(x + y),
        Operator::Sub => wrap(x - y),
        Operator::Mul => wrap(x * y),
        Operator::Quo if y == 0.0 => Err(EvalError::DivisionByZero),
        Operator::Quo => wrap(x / y),
        Operator::EQ => Ok(Value::Bool(x == y)),
        Operator::NE => Ok(Value::Bool(x != y)),
        Operator::LT => Ok(Value::Bool(x < y)),
        Operator::LE => Ok(Value::Bool(x <= y)),
        Operator::GT => Ok(Value::Bool(x > y)),
        Operator::GE => Ok(Value::Bool(x >= y)),
        _ => unreachable!("operator table admits no other float operator"),
    }
}

fn is_overflowed(value: &Value) -> bool {
    match value {
        Value::Float32(v) => v.is_infinite(),
        Value::Float64(v) => v.is_infinite(),
        Value::Complex64(c) => c.re.is_infinite() || c.im.is_infinite(),
        Value::Complex128(c) => c.re.is_infinite() || c.im.is_infinite(),
        _ => false,
    }
}

fn complex_op(kind: Kind, op: Operator, args: &[Value]) -> Result<Value, EvalError> {
    let x = operand(args, 0, Value::as_complex);
    let wrap = |c: Complex64| -> Result<Value, EvalError> {
        match Value::from_complex(kind, c) {
            Some(value) if !is_overflowed(&value) => Ok(value),
            _ => Err(EvalError::Overflow),
        }
    };

    if op == Operator::Neg {
        return wrap(-x);
    }

    let y = operand(args, 1, Value::as_complex);
    match op {
        Operator::Add => wrap(x + y),
        Operator::Sub => wrap(x - y),
        Operator::Mul => wrap(x * y),
        Operator::Quo if y.re == 0.0 && y.im == 0.0 => Err(EvalError::DivisionByZero),
        Operator::Quo => wrap(x / y),
        Operator::EQ => Ok(Value::Bool(x == y)),
        Operator::NE => Ok(Value::Bool(x != y)),
        _ => unreachable!("operator table admits no other complex operator"),
    }
}
