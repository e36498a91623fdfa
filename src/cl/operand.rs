use std::fmt;
use std::sync::Arc;

use crate::cl::constant::ConstVal;
use crate::cl::internal_error;
use crate::exec::kind::Kind;
use crate::exec::spec::{FuncInfo, GoPackage, Interface, SymbolKind};
use crate::exec::types::Type;

// =============================================================================
// OPERAND - result of lowering one expression
// =============================================================================

/// Compile-time result of an expression.
///
/// The set of shapes is closed; code that consumes operands matches on it
/// exhaustively.
#[derive(Debug)]
pub enum Operand {
    /// A value whose runtime type is already fixed.
    Go(GoValue),
    /// A package, type or builtin name. Never usable as a value.
    Non(NonValue),
    /// Results of a call with zero or several outputs.
    Results(FuncResults),
    Const(ConstVal),
    /// A function declared in the program.
    QlFunc(QlFunc),
    /// A native function.
    GoFunc(GoFunc),
}

impl Operand {
    pub fn go(ty: Type) -> Self {
        Operand::Go(GoValue { ty })
    }

    pub fn kind(&self) -> Kind {
        match self {
            Operand::Go(v) => v.ty.kind(),
            Operand::Non(_) => Kind::Invalid,
            Operand::Results(r) => internal_error(format!(
                "kind of a {}-value call result requested",
                r.values.len()
            )),
            Operand::Const(c) => c.kind(),
            Operand::QlFunc(_) | Operand::GoFunc(_) => Kind::Func,
        }
    }

    /// Static type of a single value.
    ///
    /// Calling this on a non-value, on unprojected call results or on an unbound
    /// constant is an internal error; see [`Operand::try_ty`] and [`bound_type`].
    pub fn ty(&self) -> Type {
        match self.try_ty() {
            Some(t) => t,
            None => internal_error(format!("type of {} requested", self.describe())),
        }
    }

    pub fn try_ty(&self) -> Option<Type> {
        match self {
            Operand::Go(v) => Some(v.ty.clone()),
            Operand::Non(_) | Operand::Results(_) => None,
            Operand::Const(c) => c.ty(),
            Operand::QlFunc(f) => Some(f.proto()),
            Operand::GoFunc(f) => Some(f.ty.clone()),
        }
    }

    pub fn num_values(&self) -> usize {
        match self {
            Operand::Non(_) => 0,
            Operand::Results(r) => r.values.len(),
            _ => 1,
        }
    }

    /// The i'th component of a multi-value result; single values project to themselves.
    pub fn value(&self, i: usize) -> &Operand {
        match self {
            Operand::Results(r) => match r.values.get(i) {
                Some(v) => v,
                None => internal_error(format!(
                    "result {} of a {}-value call requested",
                    i,
                    r.values.len()
                )),
            },
            _ => self,
        }
    }

    fn describe(&self) -> String {
        match self {
            Operand::Non(n) => format!("non-value {}", n),
            Operand::Results(r) => format!("{}-value call result", r.values.len()),
            Operand::Const(c) => format!("{} constant", c.kind()),
            _ => "value".to_string(),
        }
    }
}

impl From<ConstVal> for Operand {
    fn from(c: ConstVal) -> Self {
        Operand::Const(c)
    }
}

/// Whether `v` is a single value of the predeclared `bool` type.
pub fn is_bool(v: &Operand) -> bool {
    v.num_values() == 1 && v.try_ty().is_some_and(|t| t == Type::bool())
}

/// Type `v` has once bound; unbound constants report their default type.
pub fn bound_type(v: &Operand) -> Type {
    match v {
        Operand::Const(c) => c.bound_type(),
        other => other.ty(),
    }
}

// =============================================================================
// VARIANTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoValue {
    pub ty: Type,
}

/// Compile-time-only entity found in expression position.
#[derive(Debug, Clone)]
pub enum NonValue {
    Package(Arc<dyn GoPackage>),
    Type(Type),
    /// A builtin such as `len` or `make`, before it is applied.
    Builtin(&'static str),
}

impl fmt::Display for NonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonValue::Package(p) => write!(f, "package {}", p.pkg_path()),
            NonValue::Type(t) => write!(f, "type {}", t),
            NonValue::Builtin(name) => write!(f, "builtin {}", name),
        }
    }
}

/// Outputs of a call with other than exactly one result.
#[derive(Debug)]
pub struct FuncResults {
    tfn: Type,
    values: Vec<Operand>,
}

impl FuncResults {
    /// Type of the called function.
    pub fn func_type(&self) -> &Type {
        &self.tfn
    }
}

/// Operand for the results of calling a function of type `tfn`.
///
/// A single result is returned directly as a value; only zero or several
/// results are wrapped.
pub fn new_func_results(tfn: &Type) -> Operand {
    let n = tfn.num_out();
    if n == 1 {
        return Operand::go(tfn.out(0));
    }
    Operand::Results(FuncResults {
        tfn: tfn.clone(),
        values: (0..n).map(|i| Operand::go(tfn.out(i))).collect(),
    })
}

/// Reference to a function declared in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QlFunc(pub FuncInfo);

impl QlFunc {
    pub fn func_info(&self) -> &FuncInfo {
        &self.0
    }

    /// Function type, used to check call arguments.
    pub fn proto(&self) -> Type {
        self.0.ty()
    }

    pub fn results(&self) -> Operand {
        new_func_results(&self.proto())
    }
}

/// Reference to a native function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFunc {
    ty: Type,
    addr: u32,
    kind: SymbolKind,
    is_method: bool,
}

impl GoFunc {
    /// Look up the signature of the native function at `addr`.
    ///
    /// `kind` must be `Func` or `Funcv`; variables are not callable.
    pub fn new(addr: u32, kind: SymbolKind, is_method: bool, iface: &dyn Interface) -> Self {
        use crate::exec::spec::{GoFuncAddr, GoFuncvAddr};

        let ty = match kind {
            SymbolKind::Func => iface.get_go_func_type(GoFuncAddr(addr)),
            SymbolKind::Funcv => iface.get_go_funcv_type(GoFuncvAddr(addr)),
            SymbolKind::Var => internal_error(format!("GoFunc::new: symbol {} is a variable", addr)),
        };
        Self {
            ty,
            addr,
            kind,
            is_method,
        }
    }

    pub fn addr(&self) -> u32 {
        self.addr
    }

    pub fn symbol_kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_method(&self) -> bool {
        self.is_method
    }

    pub fn proto(&self) -> Type {
        self.ty.clone()
    }

    pub fn results(&self) -> Operand {
        new_func_results(&self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::registry::Registry;
    use crate::exec::spec::Var;

    fn div_type() -> Type {
        Type::func(vec![Type::int(), Type::int()], vec![Type::int(), Type::bool()], false)
    }

    #[test]
    fn test_single_result_is_not_wrapped() {
        let tfn = Type::func(vec![Type::int()], vec![Type::string()], false);
        let r = new_func_results(&tfn);

        assert!(matches!(r, Operand::Go(_)));
        assert_eq!(r.kind(), Kind::String);
        assert_eq!(r.ty(), Type::string());
        assert_eq!(r.num_values(), 1);
        assert!(std::ptr::eq(r.value(0), &r));
    }

    #[test]
    fn test_two_results_project() {
        let r = new_func_results(&div_type());

        assert_eq!(r.num_values(), 2);
        assert_eq!(r.value(0).ty(), Type::int());
        assert_eq!(r.value(1).ty(), Type::bool());
        assert!(is_bool(r.value(1)));
        assert!(!is_bool(&r));
        assert!(r.try_ty().is_none());
    }

    #[test]
    fn test_no_results() {
        let r = new_func_results(&Type::func(vec![], vec![], false));
        assert_eq!(r.num_values(), 0);
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn test_type_of_results_is_internal_error() {
        new_func_results(&div_type()).ty();
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn test_kind_of_results_is_internal_error() {
        new_func_results(&div_type()).kind();
    }

    #[test]
    #[should_panic(expected = "result 2 of a 2-value call")]
    fn test_projection_out_of_range() {
        new_func_results(&div_type()).value(2);
    }

    #[test]
    fn test_non_value() {
        let v = Operand::Non(NonValue::Type(Type::int()));

        assert_eq!(v.kind(), Kind::Invalid);
        assert_eq!(v.num_values(), 0);
        assert!(v.try_ty().is_none());
        assert!(!is_bool(&v));
    }

    #[test]
    #[should_panic(expected = "type of non-value type int requested")]
    fn test_type_of_non_value_is_internal_error() {
        Operand::Non(NonValue::Type(Type::int())).ty();
    }

    #[test]
    fn test_ql_func() {
        let reg = Registry::builder().build();
        let info = reg
            .new_func("div", 0)
            .args(vec![Type::int(), Type::int()])
            .returns(vec![
                Var::unnamed_out(10, Type::int(), 0),
                Var::unnamed_out(11, Type::bool(), 1),
            ]);
        let f = Operand::QlFunc(QlFunc(info));

        assert_eq!(f.kind(), Kind::Func);
        assert_eq!(f.ty(), div_type());
        match &f {
            Operand::QlFunc(q) => assert_eq!(q.results().num_values(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_go_func_signature_lookup() {
        let reg = Registry::builder()
            .package("strconv", |p| {
                p.func("Itoa", Type::func(vec![Type::int()], vec![Type::string()], false));
            })
            .build();
        let addr = reg.package("strconv").unwrap().find_func("Itoa").unwrap();

        let f = GoFunc::new(addr.0, SymbolKind::Func, false, reg.as_ref());
        assert_eq!(f.proto().to_string(), "func(int) string");
        assert!(matches!(f.results(), Operand::Go(GoValue { ref ty }) if *ty == Type::string()));
        assert!(!f.is_method());
    }

    #[test]
    #[should_panic(expected = "is a variable")]
    fn test_go_func_from_variable_is_internal_error() {
        let reg = Registry::builder().build();
        GoFunc::new(0, SymbolKind::Var, false, reg.as_ref());
    }

    #[test]
    fn test_bound_type_of_const() {
        let c = Operand::from(ConstVal::int(7));
        assert_eq!(bound_type(&c), Type::int());
        assert!(c.try_ty().is_none());
        assert_eq!(bound_type(&Operand::go(Type::float32())), Type::float32());
    }
}
