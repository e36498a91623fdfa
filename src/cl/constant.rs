//! Untyped constants: folding, binding to a concrete type, and element-type
//! unification for composite literals.

use crate::cl::compile_error::{CompileError, internal_error};
use crate::cl::operand::Operand;
use crate::exec::builtin::call_builtin_op;
use crate::exec::kind::Kind;
use crate::exec::operator::Operator;
use crate::exec::spec::{Builder, GoConstInfo, Reserved};
use crate::exec::types::Type;
use crate::lang::value::Value;

/// A constant, bound to a concrete kind or still unbound.
///
/// The raw value of an unbound constant is kept in its widest form: `Int`
/// (or `Uint64` above `i64::MAX`) for integers, `Float64` for floats and
/// `Complex128` for complex numbers.
///
/// A constant may own a reserved position in the instruction stream; binding
/// it fills that position with the converted value. `ConstVal` is not `Clone`,
/// so the position is filled at most once.
#[derive(Debug)]
pub struct ConstVal {
    value: Value,
    kind: Kind,
    slot: Option<Reserved>,
}

impl ConstVal {
    pub fn new(value: Value, kind: Kind) -> Self {
        let raw_ok = match kind {
            Kind::UnboundInt => matches!(value, Value::Int(_) | Value::Uint64(_)),
            Kind::UnboundFloat => matches!(value, Value::Float64(_)),
            Kind::UnboundComplex => matches!(value, Value::Complex128(_)),
            kind => value.kind() == kind,
        };
        if !raw_ok {
            internal_error(format!("constant {:?} stored as {}", value, kind));
        }
        Self {
            value,
            kind,
            slot: None,
        }
    }

    /// Untyped integer literal.
    pub fn int(v: i64) -> Self {
        Self::new(Value::Int(v), Kind::UnboundInt)
    }

    /// Untyped integer literal given as an unsigned value.
    pub fn uint(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Self::int(v),
            Err(_) => Self::new(Value::Uint64(v), Kind::UnboundInt),
        }
    }

    pub fn float(v: f64) -> Self {
        Self::new(Value::Float64(v), Kind::UnboundFloat)
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Self::new(
            Value::Complex128(num_complex::Complex64::new(re, im)),
            Kind::UnboundComplex,
        )
    }

    /// Constant already bound to the kind of `value`.
    pub fn typed(value: Value) -> Self {
        let kind = value.kind();
        Self::new(value, kind)
    }

    /// Constant exported by a native package.
    pub fn from_go_const(info: &GoConstInfo) -> Self {
        Self::new(info.value.clone(), info.kind)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is_bound(&self) -> bool {
        self.kind.is_bound()
    }

    /// Whether an instruction position is waiting for this constant.
    pub fn is_reserved(&self) -> bool {
        self.slot.is_some()
    }

    /// Type of a bound constant.
    pub fn ty(&self) -> Option<Type> {
        if self.is_bound() {
            Type::from_kind(self.kind)
        } else {
            None
        }
    }

    /// Reserve the position where this constant will be pushed once bound.
    pub fn reserve<B: Builder>(&mut self, b: &mut B) {
        if self.slot.is_some() {
            internal_error(format!("constant {} reserved twice", self.value.literal()));
        }
        let r = b.reserve();
        tracing::debug!(pos = r.pos(), value = %self.value.literal(), "constant position reserved");
        self.slot = Some(r);
    }

    /// Kind the constant takes when nothing else determines it.
    pub fn bound_kind(&self) -> Kind {
        match self.kind {
            Kind::UnboundInt => match self.value {
                Value::Uint64(_) => Kind::Uint,
                _ => Kind::Int,
            },
            Kind::UnboundFloat => Kind::Float64,
            Kind::UnboundComplex => Kind::Complex128,
            kind => kind,
        }
    }

    pub fn bound_type(&self) -> Type {
        kind_type(self.bound_kind())
    }

    /// Bind to `t`, filling the reserved position if there is one.
    ///
    /// A bound constant only accepts a target of its own kind, or the empty
    /// interface. An unbound constant is converted exactly; a value that does
    /// not fit `t` is an error. An unbound constant bound to the empty
    /// interface takes its default kind.
    ///
    /// On error nothing is emitted and the constant is left as it was, still
    /// owning its reserved position, so it can be bound again.
    pub fn bound<B: Builder>(&mut self, t: &Type, b: &mut B) -> Result<(), CompileError> {
        let target = if t.is_empty_interface() {
            self.bound_kind()
        } else {
            t.kind()
        };

        if self.kind.is_bound() {
            if self.kind != target && !t.is_empty_interface() {
                return Err(CompileError::type_mismatch(t, self.kind));
            }
        } else {
            let bound = self
                .value
                .represent(target)
                .map_err(|e| CompileError::from_repr(e, &self.value, t))?;
            tracing::debug!(from = %self.kind, to = %t, value = %bound.literal(), "constant bound");
            self.value = bound;
            self.kind = target;
        }

        if let Some(r) = self.slot.take() {
            tracing::debug!(pos = r.pos(), "reserved constant resolved");
            r.push(b, self.value.clone());
        }
        Ok(())
    }

    fn check_unreserved(&self, what: &str) {
        if self.slot.is_some() {
            internal_error(format!("{}: operand {} has a pending reservation", what, self.value.literal()));
        }
    }
}

fn kind_type(kind: Kind) -> Type {
    Type::from_kind(kind).unwrap_or_else(|| internal_error(format!("no basic type for kind {}", kind)))
}

/// Concrete kind in which operands governed by `kind` are computed.
///
/// Untyped integers are computed as `Uint64` only when one of the untyped
/// operands holds a value above `i64::MAX`.
fn fold_kind(kind: Kind, operands: &[&ConstVal]) -> Kind {
    let wide = |c: &&ConstVal| c.kind == Kind::UnboundInt && matches!(c.value, Value::Uint64(_));
    match kind {
        Kind::UnboundInt if operands.iter().any(wide) => Kind::Uint64,
        Kind::UnboundInt => Kind::Int,
        Kind::UnboundFloat => Kind::Float64,
        Kind::UnboundComplex => Kind::Complex128,
        kind => kind,
    }
}

fn to_kind(v: &Value, kind: Kind) -> Result<Value, CompileError> {
    v.represent(kind)
        .map_err(|e| CompileError::from_repr(e, v, &kind_type(kind)))
}

/// Wrap a folded value; untyped results stay untyped.
fn folded(op: Operator, kind: Kind, v: Value) -> ConstVal {
    let kind = op.result_kind(kind);
    let v = match (kind, v) {
        (Kind::UnboundInt, Value::Uint64(u)) if u <= i64::MAX as u64 => Value::Int(u as i64),
        (_, v) => v,
    };
    ConstVal::new(v, kind)
}

/// Fold a unary operator over a constant.
pub fn unary_op(op: Operator, x: &ConstVal) -> Result<ConstVal, CompileError> {
    if !op.is_unary() {
        internal_error(format!("unary_op: `{}` is a binary operator", op));
    }
    x.check_unreserved("unary_op");

    let kind = x.kind;
    if !op.info().accepts_first(kind.real_kind()) {
        return Err(CompileError::InvalidOperand { op, kind });
    }
    let real = fold_kind(kind, &[x]);
    let vx = to_kind(&x.value, real)?;
    let v = call_builtin_op(real, op, &[vx]).map_err(|e| CompileError::from_eval(e, op, kind))?;
    Ok(folded(op, kind, v))
}

/// Fold a binary operator over two constants.
///
/// A bound operand decides the kind of the result; between two unbound
/// operands the higher of int < float < complex wins. Shifts take the kind of
/// their left operand.
pub fn binary_op(op: Operator, x: &ConstVal, y: &ConstVal) -> Result<ConstVal, CompileError> {
    if op.is_unary() {
        internal_error(format!("binary_op: `{}` is a unary operator", op));
    }
    x.check_unreserved("binary_op");
    y.check_unreserved("binary_op");

    let kind = if op.is_shift() {
        x.kind
    } else {
        match (x.kind.is_bound(), y.kind.is_bound()) {
            (true, true) if x.kind != y.kind => {
                return Err(CompileError::type_mismatch(x.kind, y.kind));
            }
            (true, _) => x.kind,
            (false, true) => y.kind,
            (false, false) => x.kind.max(y.kind),
        }
    };
    if !op.info().accepts_first(kind.real_kind()) {
        return Err(CompileError::InvalidOperand { op, kind });
    }

    let (real, vy) = if op.is_shift() {
        (fold_kind(kind, &[x]), shift_count(op, y)?)
    } else {
        let real = fold_kind(kind, &[x, y]);
        (real, to_kind(&y.value, real)?)
    };
    let vx = to_kind(&x.value, real)?;
    let v = call_builtin_op(real, op, &[vx, vy]).map_err(|e| CompileError::from_eval(e, op, kind))?;
    Ok(folded(op, kind, v))
}

/// Shift counts keep their own integer kind; an untyped count must be integral.
fn shift_count(op: Operator, y: &ConstVal) -> Result<Value, CompileError> {
    if y.kind.is_bound() {
        if !y.kind.is_integer() {
            return Err(CompileError::InvalidOperand { op, kind: y.kind });
        }
        return Ok(y.value.clone());
    }
    match y.value {
        Value::Int(_) | Value::Uint64(_) => Ok(y.value.clone()),
        _ => to_kind(&y.value, Kind::Int64),
    }
}

/// Whether constant `v` can be bound to `t`.
pub fn const_is_convertible(v: &Value, t: &Type) -> bool {
    if t.is_empty_interface() {
        return true;
    }
    match t.kind() {
        Kind::String => v.kind() == Kind::String,
        Kind::Complex64 | Kind::Complex128 => v.as_complex().is_some() && v.represent(t.kind()).is_ok(),
        kind => v.represent(kind).is_ok(),
    }
}

/// Element type of a composite literal.
///
/// Looks at `elts[base..max]` with stride `step`, so keys and values of a map
/// literal can be unified separately. An explicitly typed element decides the
/// type and every untyped constant must convert to it; otherwise all untyped
/// constants must share one default type. Returns `None` for no elements.
pub fn bound_element_type(
    elts: &[Operand],
    base: usize,
    max: usize,
    step: usize,
) -> Result<Option<Type>, CompileError> {
    if step == 0 {
        internal_error("bound_element_type: zero step");
    }
    let elts = match elts.get(base..max) {
        Some(elts) => elts,
        None => internal_error(format!(
            "bound_element_type: range {}..{} of {} elements",
            base,
            max,
            elts.len()
        )),
    };

    let mut t_bound: Option<Type> = None;
    let mut unbound: Vec<&ConstVal> = Vec::new();
    for e in elts.iter().step_by(step) {
        match e.num_values() {
            1 => {}
            0 => return Err(CompileError::NotAValue),
            count => return Err(CompileError::MultipleValues { count }),
        }
        if let Operand::Const(c) = e {
            if !c.is_bound() {
                unbound.push(c);
                continue;
            }
        }
        let t = e.ty();
        match &t_bound {
            Some(prev) if *prev != t => {
                tracing::debug!(first = %prev, second = %t, "composite literal elements disagree");
                return Err(CompileError::MismatchedElements);
            }
            Some(_) => {}
            None => t_bound = Some(t),
        }
    }

    if let Some(t) = t_bound {
        if unbound.iter().any(|c| !const_is_convertible(&c.value, &t)) {
            return Err(CompileError::MismatchedElements);
        }
        tracing::debug!(ty = %t, "element type from typed element");
        return Ok(Some(t));
    }

    let mut kind = None;
    for c in &unbound {
        let k = c.bound_kind();
        match kind {
            Some(prev) if prev != k => return Err(CompileError::MismatchedElements),
            _ => kind = Some(k),
        }
    }
    let t = kind.map(kind_type);
    if let Some(t) = &t {
        tracing::debug!(ty = %t, "element type from untyped constants");
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{Builder as BcBuilder, Op};
    use crate::cl::compile_error::Diagnostics;
    use crate::exec::registry::Registry;
    use crate::exec::spec::Builder;

    fn builder() -> BcBuilder {
        BcBuilder::new(Registry::builder().build())
    }

    fn my_int() -> Type {
        Type::named("main", "MyInt", Type::int())
    }

    // =========================================================================
    // Binding
    // =========================================================================

    #[test]
    fn test_bound_is_idempotent() {
        let mut b = builder();
        let mut c = ConstVal::typed(Value::Int8(5));

        c.bound(&Type::int8(), &mut b).unwrap();
        c.bound(&Type::int8(), &mut b).unwrap();

        assert_eq!(c.kind(), Kind::Int8);
        assert_eq!(c.value(), &Value::Int8(5));
        assert_eq!(b.resolve().ops().len(), 0);
    }

    #[test]
    fn test_bound_kind_mismatch_fails() {
        let mut b = builder();
        let mut c = ConstVal::typed(Value::Int(5));

        let err = c.bound(&Type::float32(), &mut b).unwrap_err();
        assert_eq!(err, CompileError::type_mismatch("float32", "int"));
    }

    #[test]
    fn test_bound_constant_accepts_empty_interface() {
        let mut b = builder();
        let mut c = ConstVal::typed(Value::String("hi".into()));

        c.bound(&Type::empty_interface(), &mut b).unwrap();
        assert_eq!(c.kind(), Kind::String);
    }

    #[test]
    fn test_default_binding_of_unbound_int() {
        let mut b = builder();
        let mut c = ConstVal::int(-42);
        assert_eq!(c.bound_type(), Type::int());

        let t = c.bound_type();
        c.bound(&t, &mut b).unwrap();
        assert_eq!(c.value(), &Value::Int(-42));
        assert!(c.is_bound());
    }

    #[test]
    fn test_default_binding_of_large_unsigned() {
        let c = ConstVal::uint(u64::MAX);
        assert_eq!(c.bound_kind(), Kind::Uint);

        let small = ConstVal::uint(7);
        assert_eq!(small.value(), &Value::Int(7));
        assert_eq!(small.bound_kind(), Kind::Int);
    }

    #[test]
    fn test_default_kinds_of_float_and_complex() {
        assert_eq!(ConstVal::float(1.5).bound_kind(), Kind::Float64);
        assert_eq!(ConstVal::complex(1.0, 2.0).bound_kind(), Kind::Complex128);
    }

    #[test]
    fn test_unbound_binds_to_narrower_type() {
        let mut b = builder();
        let mut c = ConstVal::int(-1);
        c.bound(&Type::float32(), &mut b).unwrap();
        assert_eq!(c.value(), &Value::Float32(-1.0));
        assert_eq!(c.kind(), Kind::Float32);
    }

    #[test]
    fn test_unbound_binds_to_named_type_by_kind() {
        let mut b = builder();
        let mut c = ConstVal::int(3);
        c.bound(&my_int(), &mut b).unwrap();
        assert_eq!(c.kind(), Kind::Int);
    }

    #[test]
    fn test_unbound_to_interface_takes_default() {
        let mut b = builder();
        let mut c = ConstVal::float(0.5);
        c.bound(&Type::empty_interface(), &mut b).unwrap();
        assert_eq!(c.kind(), Kind::Float64);
    }

    #[test]
    fn test_binding_overflow_and_truncation() {
        let mut b = builder();
        let err = ConstVal::int(300).bound(&Type::int8(), &mut b).unwrap_err();
        assert_eq!(err.to_string(), "constant 300 overflows int8");

        let err = ConstVal::float(2.5).bound(&Type::int(), &mut b).unwrap_err();
        assert!(matches!(err, CompileError::Truncated { .. }));

        let mut c = ConstVal::int(1);
        let err = c.bound(&Type::string(), &mut b).unwrap_err();
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert!(matches!(err, CompileError::InvalidConversion { .. }));
    }

    #[test]
    fn test_bound_fills_reserved_position() {
        let mut b = builder();
        b.push(Value::String("x".into()));
        let mut c = ConstVal::int(7);
        c.reserve(&mut b);
        assert!(c.is_reserved());
        b.builtin_op(Kind::Int8, Operator::Add);

        c.bound(&Type::int8(), &mut b).unwrap();
        assert!(!c.is_reserved());

        let code = b.resolve();
        assert_eq!(code.ops()[1], Op::Push(Value::Int8(7)));
        assert_eq!(code.ops()[2], Op::BuiltinOp(Kind::Int8, Operator::Add));
    }

    #[test]
    fn test_failed_binding_emits_nothing() {
        let mut b = builder();
        let mut c = ConstVal::int(1000);
        c.reserve(&mut b);

        assert!(c.bound(&Type::uint8(), &mut b).is_err());
        assert_eq!(b.pending_reservations(), 1);
        assert!(c.is_reserved());
        assert_eq!(c.kind(), Kind::UnboundInt);
    }

    #[test]
    fn test_failed_binding_can_be_retried() {
        let mut b = builder();
        let mut diags = Diagnostics::default();
        let mut c = ConstVal::int(1000);
        c.reserve(&mut b);

        assert!(diags.check(c.bound(&Type::uint8(), &mut b)).is_none());
        assert!(diags.has_errors());

        c.bound(&Type::int16(), &mut b).unwrap();
        assert_eq!(b.pending_reservations(), 0);

        let code = b.resolve();
        assert_eq!(code.ops(), &[Op::Push(Value::Int16(1000))]);
    }

    #[test]
    #[should_panic(expected = "reserved twice")]
    fn test_double_reserve_is_internal_error() {
        let mut b = builder();
        let mut c = ConstVal::int(1);
        c.reserve(&mut b);
        c.reserve(&mut b);
    }

    #[test]
    #[should_panic(expected = "stored as")]
    fn test_malformed_constant_is_internal_error() {
        ConstVal::new(Value::Int8(1), Kind::UnboundInt);
    }

    #[test]
    fn test_from_go_const() {
        let info = GoConstInfo {
            pkg_path: "math".into(),
            name: "MaxInt8".into(),
            kind: Kind::UnboundInt,
            value: Value::Int(127),
        };
        let c = ConstVal::from_go_const(&info);
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert!(c.ty().is_none());
    }

    // =========================================================================
    // Folding
    // =========================================================================

    #[test]
    fn test_unbound_int_addition_stays_unbound() {
        let c = binary_op(Operator::Add, &ConstVal::int(1), &ConstVal::int(2)).unwrap();
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert_eq!(c.value(), &Value::Int(3));
    }

    #[test]
    fn test_int_plus_float_promotes() {
        let c = binary_op(Operator::Add, &ConstVal::int(1), &ConstVal::float(2.5)).unwrap();
        assert_eq!(c.kind(), Kind::UnboundFloat);
        assert_eq!(c.value(), &Value::Float64(3.5));

        let c = binary_op(Operator::Mul, &ConstVal::float(0.5), &ConstVal::complex(0.0, 2.0)).unwrap();
        assert_eq!(c.kind(), Kind::UnboundComplex);
        assert_eq!(c.value().as_complex(), Some(num_complex::Complex64::new(0.0, 1.0)));
    }

    #[test]
    fn test_bound_operand_governs() {
        let x = ConstVal::typed(Value::Int8(100));
        let c = binary_op(Operator::Sub, &ConstVal::int(27), &x).unwrap();
        assert_eq!(c.kind(), Kind::Int8);
        assert_eq!(c.value(), &Value::Int8(-73));

        let err = binary_op(Operator::Add, &x, &ConstVal::int(100)).unwrap_err();
        assert!(matches!(err, CompileError::Overflow { .. }));
    }

    #[test]
    fn test_untyped_float_truncated_by_int_operand() {
        let x = ConstVal::typed(Value::Int(1));
        let err = binary_op(Operator::Add, &x, &ConstVal::float(0.5)).unwrap_err();
        assert!(matches!(err, CompileError::Truncated { .. }));
    }

    #[test]
    fn test_two_bound_kinds_mismatch() {
        let x = ConstVal::typed(Value::Int8(1));
        let y = ConstVal::typed(Value::Int16(1));
        let err = binary_op(Operator::Add, &x, &y).unwrap_err();
        assert!(matches!(err, CompileError::TypeMismatch { .. }));
    }

    #[test]
    fn test_invalid_operand_kind() {
        let err = binary_op(Operator::Mod, &ConstVal::float(1.5), &ConstVal::int(2)).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidOperand {
                op: Operator::Mod,
                kind: Kind::UnboundFloat
            }
        );

        let err = unary_op(Operator::Not, &ConstVal::int(1)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidOperand { .. }));
    }

    #[test]
    fn test_unary_preserves_unbound() {
        let c = unary_op(Operator::Neg, &ConstVal::int(1)).unwrap();
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert_eq!(c.value(), &Value::Int(-1));

        let mut b = builder();
        let mut c = c;
        c.bound(&Type::float32(), &mut b).unwrap();
        assert_eq!(c.value(), &Value::Float32(-1.0));
    }

    #[test]
    fn test_bit_not_and_logical_not() {
        let c = unary_op(Operator::BitNot, &ConstVal::typed(Value::Uint8(0x0f))).unwrap();
        assert_eq!(c.value(), &Value::Uint8(0xf0));

        let c = unary_op(Operator::Not, &ConstVal::typed(Value::Bool(true))).unwrap();
        assert_eq!(c.value(), &Value::Bool(false));
    }

    #[test]
    fn test_comparison_yields_bool() {
        let c = binary_op(Operator::LT, &ConstVal::int(1), &ConstVal::float(1.5)).unwrap();
        assert_eq!(c.kind(), Kind::Bool);
        assert_eq!(c.value(), &Value::Bool(true));
    }

    #[test]
    fn test_string_concatenation() {
        let x = ConstVal::typed(Value::String("go".into()));
        let y = ConstVal::typed(Value::String("+".into()));
        let c = binary_op(Operator::Add, &x, &y).unwrap();
        assert_eq!(c.value(), &Value::String("go+".into()));
    }

    #[test]
    fn test_shift_takes_left_kind() {
        let n = ConstVal::typed(Value::Uint(3));
        let c = binary_op(Operator::Lsh, &ConstVal::int(1), &n).unwrap();
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert_eq!(c.value(), &Value::Int(8));
    }

    #[test]
    fn test_shift_by_typed_uint64_count() {
        let n = ConstVal::typed(Value::Uint64(3));
        let c = binary_op(Operator::Lsh, &ConstVal::int(-1), &n).unwrap();
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert_eq!(c.value(), &Value::Int(-8));
    }

    #[test]
    fn test_shift_count_is_checked_apart_from_left_operand() {
        let x = ConstVal::typed(Value::Uint8(1));
        let err = binary_op(Operator::Lsh, &x, &ConstVal::int(-1)).unwrap_err();
        assert_eq!(err, CompileError::InvalidShift);

        let zero = ConstVal::typed(Value::Int8(0));
        let c = binary_op(Operator::Lsh, &zero, &ConstVal::int(200)).unwrap();
        assert_eq!(c.value(), &Value::Int8(0));

        let c = binary_op(Operator::Lsh, &ConstVal::int(1), &ConstVal::float(2.0)).unwrap();
        assert_eq!(c.value(), &Value::Int(4));

        let err = binary_op(Operator::Lsh, &ConstVal::int(1), &ConstVal::typed(Value::Float32(2.0))).unwrap_err();
        assert!(matches!(err, CompileError::InvalidOperand { op: Operator::Lsh, .. }));
    }

    #[test]
    fn test_large_unsigned_folding() {
        let c = binary_op(Operator::Sub, &ConstVal::uint(u64::MAX), &ConstVal::uint(u64::MAX - 1)).unwrap();
        assert_eq!(c.kind(), Kind::UnboundInt);
        assert_eq!(c.value(), &Value::Int(1));
    }

    #[test]
    fn test_division_by_zero() {
        let err = binary_op(Operator::Quo, &ConstVal::int(1), &ConstVal::int(0)).unwrap_err();
        assert_eq!(err, CompileError::DivisionByZero);
    }

    #[test]
    #[should_panic(expected = "pending reservation")]
    fn test_folding_reserved_operand_is_internal_error() {
        let mut b = builder();
        let mut x = ConstVal::int(1);
        x.reserve(&mut b);
        let _ = unary_op(Operator::Neg, &x);
    }

    #[test]
    #[should_panic(expected = "is a binary operator")]
    fn test_unary_op_with_binary_operator() {
        let _ = unary_op(Operator::Add, &ConstVal::int(1));
    }

    // =========================================================================
    // Element types
    // =========================================================================

    #[test]
    fn test_untyped_ints_unify_to_int() {
        let elts = vec![Operand::from(ConstVal::int(1)), Operand::from(ConstVal::int(2))];
        assert_eq!(bound_element_type(&elts, 0, 2, 1).unwrap(), Some(Type::int()));
    }

    #[test]
    fn test_int_and_float_constants_do_not_unify() {
        let elts = vec![Operand::from(ConstVal::int(1)), Operand::from(ConstVal::float(2.5))];
        assert_eq!(
            bound_element_type(&elts, 0, 2, 1).unwrap_err(),
            CompileError::MismatchedElements
        );
    }

    #[test]
    fn test_typed_element_decides() {
        let elts = vec![Operand::go(my_int()), Operand::from(ConstVal::int(2))];
        assert_eq!(bound_element_type(&elts, 0, 2, 1).unwrap(), Some(my_int()));
    }

    #[test]
    fn test_two_typed_elements_disagree() {
        let other = Type::named("main", "Other", Type::int());
        let elts = vec![Operand::go(my_int()), Operand::go(other)];
        assert!(bound_element_type(&elts, 0, 2, 1).is_err());
    }

    #[test]
    fn test_constant_not_convertible_to_typed_element() {
        let elts = vec![Operand::go(Type::uint8()), Operand::from(ConstVal::int(-1))];
        assert!(bound_element_type(&elts, 0, 2, 1).is_err());

        let elts = vec![Operand::go(Type::string()), Operand::from(ConstVal::int(1))];
        assert!(bound_element_type(&elts, 0, 2, 1).is_err());

        let elts = vec![Operand::go(Type::complex64()), Operand::from(ConstVal::int(1))];
        assert_eq!(bound_element_type(&elts, 0, 2, 1).unwrap(), Some(Type::complex64()));
    }

    #[test]
    fn test_stride_selects_map_keys_and_values() {
        let elts = vec![
            Operand::from(ConstVal::typed(Value::String("a".into()))),
            Operand::from(ConstVal::int(1)),
            Operand::from(ConstVal::typed(Value::String("b".into()))),
            Operand::from(ConstVal::float(2.0)),
        ];

        assert_eq!(bound_element_type(&elts, 0, 4, 2).unwrap(), Some(Type::string()));
        assert_eq!(bound_element_type(&elts, 1, 4, 2).unwrap_err(), CompileError::MismatchedElements);
    }

    #[test]
    fn test_empty_literal_has_no_element_type() {
        assert_eq!(bound_element_type(&[], 0, 0, 1).unwrap(), None);
    }

    #[test]
    fn test_multi_value_element_rejected() {
        let tfn = Type::func(vec![], vec![Type::int(), Type::int()], false);
        let elts = vec![crate::cl::operand::new_func_results(&tfn)];
        assert_eq!(
            bound_element_type(&elts, 0, 1, 1).unwrap_err(),
            CompileError::MultipleValues { count: 2 }
        );
    }

    #[test]
    fn test_const_is_convertible() {
        assert!(const_is_convertible(&Value::Int(1), &Type::float32()));
        assert!(const_is_convertible(&Value::Float64(2.0), &Type::int()));
        assert!(!const_is_convertible(&Value::Float64(2.5), &Type::int()));
        assert!(!const_is_convertible(&Value::String("s".into()), &Type::int()));
        assert!(const_is_convertible(&Value::String("s".into()), &Type::empty_interface()));
    }
}
