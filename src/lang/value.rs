use num_complex::{Complex32, Complex64};
use num_traits::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::exec::kind::Kind;

/// Concrete value of a compile-time constant.
///
/// Each variant carries the native representation of one basic kind, so a
/// `Value` always knows the width it would be pushed with. Unbound constants
/// keep their raw literal here (`Int`, `Uint64`, `Float64`, `Complex128`) until
/// they are bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(u64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uintptr(u64),
    Float32(f32),
    Float64(f64),
    Complex64(Complex32),
    Complex128(Complex64),
    String(String),
}

/// Why a value could not be represented exactly in a target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReprError {
    /// The value is out of range of the target kind.
    Overflow,
    /// A fractional or imaginary part would be lost.
    Truncated,
    /// The value's kind does not convert to the target kind at all.
    Incompatible,
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Int8(_) => Kind::Int8,
            Value::Int16(_) => Kind::Int16,
            Value::Int32(_) => Kind::Int32,
            Value::Int64(_) => Kind::Int64,
            Value::Uint(_) => Kind::Uint,
            Value::Uint8(_) => Kind::Uint8,
            Value::Uint16(_) => Kind::Uint16,
            Value::Uint32(_) => Kind::Uint32,
            Value::Uint64(_) => Kind::Uint64,
            Value::Uintptr(_) => Kind::Uintptr,
            Value::Float32(_) => Kind::Float32,
            Value::Float64(_) => Kind::Float64,
            Value::Complex64(_) => Kind::Complex64,
            Value::Complex128(_) => Kind::Complex128,
            Value::String(_) => Kind::String,
        }
    }

    /// Integer payload widened to `i128`, which holds every signed and unsigned width.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match *self {
            Value::Int(v) | Value::Int64(v) => v as i128,
            Value::Int8(v) => v as i128,
            Value::Int16(v) => v as i128,
            Value::Int32(v) => v as i128,
            Value::Uint(v) | Value::Uint64(v) | Value::Uintptr(v) => v as i128,
            Value::Uint8(v) => v as i128,
            Value::Uint16(v) => v as i128,
            Value::Uint32(v) => v as i128,
            _ => return None,
        })
    }

    /// Integer or float payload as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }

    /// Any numeric payload as a `complex128`.
    pub fn as_complex(&self) -> Option<Complex64> {
        match *self {
            Value::Complex64(c) => Some(Complex64::new(c.re as f64, c.im as f64)),
            Value::Complex128(c) => Some(c),
            _ => self.as_f64().map(|re| Complex64::new(re, 0.0)),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Conversion with cast semantics: integers wrap, floats truncate toward zero,
    /// real numbers widen into complex with a zero imaginary part.
    ///
    /// Returns `None` when the kinds do not convert (e.g. string to int).
    /// Converting to `Interface` keeps the value unchanged.
    pub fn convert(&self, kind: Kind) -> Option<Value> {
        if kind == Kind::Interface || kind == self.kind() {
            return Some(self.clone());
        }
        if kind.is_integer() {
            let wide = match self.as_i128() {
                Some(v) => v,
                None => match *self {
                    Value::Float32(v) => v as i128,
                    Value::Float64(v) => v as i128,
                    _ => return None,
                },
            };
            return Some(int_value(kind, wide));
        }
        if kind.is_float() {
            let v = self.as_f64()?;
            return Some(float_value(kind, v));
        }
        if kind.is_complex() {
            let c = self.as_complex()?;
            return Some(complex_value(kind, c));
        }
        None
    }

    /// Conversion that must preserve the value exactly, as required when binding
    /// an untyped constant to a concrete type.
    pub fn represent(&self, kind: Kind) -> Result<Value, ReprError> {
        if kind == Kind::Interface || kind == self.kind() {
            return Ok(self.clone());
        }
        if kind.is_integer() {
            let wide = match self.as_i128() {
                Some(v) => v,
                None => {
                    let c = self.as_complex().ok_or(ReprError::Incompatible)?;
                    if c.im != 0.0 || c.re.fract() != 0.0 || !c.re.is_finite() {
                        return Err(ReprError::Truncated);
                    }
                    c.re.to_i128().ok_or(ReprError::Overflow)?
                }
            };
            if !int_fits(kind, wide) {
                return Err(ReprError::Overflow);
            }
            return Ok(int_value(kind, wide));
        }
        if kind.is_float() {
            let c = self.as_complex().ok_or(ReprError::Incompatible)?;
            if c.im != 0.0 {
                return Err(ReprError::Truncated);
            }
            if kind == Kind::Float32 && c.re.is_finite() && (c.re as f32).is_infinite() {
                return Err(ReprError::Overflow);
            }
            return Ok(float_value(kind, c.re));
        }
        if kind.is_complex() {
            let c = self.as_complex().ok_or(ReprError::Incompatible)?;
            if kind == Kind::Complex64
                && (c.re.is_finite() && (c.re as f32).is_infinite()
                    || c.im.is_finite() && (c.im as f32).is_infinite())
            {
                return Err(ReprError::Overflow);
            }
            return Ok(complex_value(kind, c));
        }
        Err(ReprError::Incompatible)
    }

    /// Integer value of `kind`, or `None` when `v` is out of its range.
    pub fn from_i128(kind: Kind, v: i128) -> Option<Value> {
        int_fits(kind, v).then(|| int_value(kind, v))
    }

    /// Float value of `kind`; `None` when `kind` is not a float kind.
    pub fn from_f64(kind: Kind, v: f64) -> Option<Value> {
        kind.is_float().then(|| float_value(kind, v))
    }

    /// Complex value of `kind`; `None` when `kind` is not a complex kind.
    pub fn from_complex(kind: Kind, c: Complex64) -> Option<Value> {
        kind.is_complex().then(|| complex_value(kind, c))
    }

    /// Go source literal for this value, without a conversion wrapper.
    pub fn literal(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Float32(v) => float_literal(*v as f64),
            Value::Float64(v) => float_literal(*v),
            Value::Complex64(c) => complex_literal(c.re as f64, c.im as f64),
            Value::Complex128(c) => complex_literal(c.re, c.im),
            Value::String(s) => quote(s),
            other => match other.as_i128() {
                Some(v) => v.to_string(),
                None => unreachable!("non-integer value handled above"),
            },
        }
    }
}

fn int_fits(kind: Kind, v: i128) -> bool {
    let (min, max): (i128, i128) = match kind {
        Kind::Int8 => (i8::MIN as i128, i8::MAX as i128),
        Kind::Int16 => (i16::MIN as i128, i16::MAX as i128),
        Kind::Int32 => (i32::MIN as i128, i32::MAX as i128),
        Kind::Int | Kind::Int64 => (i64::MIN as i128, i64::MAX as i128),
        Kind::Uint8 => (0, u8::MAX as i128),
        Kind::Uint16 => (0, u16::MAX as i128),
        Kind::Uint32 => (0, u32::MAX as i128),
        Kind::Uint | Kind::Uint64 | Kind::Uintptr => (0, u64::MAX as i128),
        _ => return false,
    };
    (min..=max).contains(&v)
}

/// Integer value of `kind`, wrapping `v` to the kind's width.
fn int_value(kind: Kind, v: i128) -> Value {
    match kind {
        Kind::Int => Value::Int(v as i64),
        Kind::Int8 => Value::Int8(v as i8),
        Kind::Int16 => Value::Int16(v as i16),
        Kind::Int32 => Value::Int32(v as i32),
        Kind::Int64 => Value::Int64(v as i64),
        Kind::Uint => Value::Uint(v as u64),
        Kind::Uint8 => Value::Uint8(v as u8),
        Kind::Uint16 => Value::Uint16(v as u16),
        Kind::Uint32 => Value::Uint32(v as u32),
        Kind::Uint64 => Value::Uint64(v as u64),
        Kind::Uintptr => Value::Uintptr(v as u64),
        _ => unreachable!("int_value called with non-integer kind {}", kind),
    }
}

fn float_value(kind: Kind, v: f64) -> Value {
    match kind {
        Kind::Float32 => Value::Float32(<f32 as NumCast>::from(v).unwrap_or(v as f32)),
        _ => Value::Float64(v),
    }
}

fn complex_value(kind: Kind, c: Complex64) -> Value {
    match kind {
        Kind::Complex64 => Value::Complex64(Complex32::new(c.re as f32, c.im as f32)),
        _ => Value::Complex128(c),
    }
}

fn float_literal(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e21 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn complex_literal(re: f64, im: f64) -> String {
    if im < 0.0 {
        format!("({} - {}i)", re, -im)
    } else {
        format!("({} + {}i)", re, im)
    }
}

/// Double-quoted Go string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            other => f.write_str(&other.literal()),
        }
    }
}
