//! The contract between the compiler front-end and a code generator.
//!
//! A backend implements [`Builder`] (one instruction stream per compilation
//! unit), [`Code`] (the finalized stream) and shares an [`Interface`] (the
//! read-only registry and handle factory). The handle types here (`Var`,
//! `Label`, `FuncInfo`, ...) carry identity; each backend keeps whatever
//! per-handle state it needs keyed by their ids.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::exec::kind::Kind;
use crate::exec::operator::{AddrOperator, GoBuiltin, Operator};
use crate::exec::types::Type;
use crate::lang::value::Value;

/// `index`/`set_index` argument: the index is on the stack.
pub const INDEX_FROM_STACK: i32 = -1;

/// `slice`/`slice3` argument: the bound is on the stack.
pub const SLICE_FROM_STACK: i32 = -1;

/// `slice`/`slice3` argument: the bound is omitted (`x[:j]`, `x[i:]`).
pub const SLICE_DEFAULT: i32 = -2;

/// Arity of a call or `append` whose last argument is spread with `...`.
pub const ARITY_ELLIPSIS: i32 = -1;

/// `return_` argument: return the current values of the named result variables.
pub const RETURN_NAMED_RESULTS: i32 = -1;

// =============================================================================
// HANDLES
// =============================================================================

/// A variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    id: u32,
    name: String,
    ty: Type,
}

impl Var {
    pub fn new(id: u32, ty: Type, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
        }
    }

    /// Variable holding the `index`'th unnamed result of a function.
    pub fn unnamed_out(id: u32, ty: Type, index: usize) -> Self {
        Self::new(id, ty, index.to_string())
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Unnamed result variables are named by their position.
    pub fn is_unnamed_out(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_digit())
    }
}

/// A jump target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    id: u32,
    name: String,
}

impl Label {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A `for k, v <- container` phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForPhrase {
    id: u32,
    container: Type,
}

impl ForPhrase {
    pub fn new(id: u32, container: Type) -> Self {
        Self { id, container }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Type of the value being ranged over.
    pub fn container(&self) -> &Type {
        &self.container
    }
}

/// A list or map comprehension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comprehension {
    id: u32,
    out: Type,
}

impl Comprehension {
    pub fn new(id: u32, out: Type) -> Self {
        Self { id, out }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Type of the produced slice or map.
    pub fn out(&self) -> &Type {
        &self.out
    }
}

/// A function declared in the program being compiled.
///
/// Created by [`Interface::new_func`] and completed with [`FuncInfo::args`]
/// (or [`FuncInfo::vargs`]) and [`FuncInfo::returns`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncInfo {
    id: u32,
    name: String,
    nest_depth: u32,
    params: Vec<Type>,
    results: Vec<Var>,
    variadic: bool,
}

impl FuncInfo {
    pub fn new(id: u32, name: impl Into<String>, nest_depth: u32) -> Self {
        Self {
            id,
            name: name.into(),
            nest_depth,
            params: Vec::new(),
            results: Vec::new(),
            variadic: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Closure nesting depth; 0 for package-level functions.
    pub fn nest_depth(&self) -> u32 {
        self.nest_depth
    }

    /// Set parameter types.
    pub fn args(mut self, params: Vec<Type>) -> Self {
        self.params = params;
        self.variadic = false;
        self
    }

    /// Set parameter types of a variadic function; the last one is the `...T` slice.
    pub fn vargs(mut self, params: Vec<Type>) -> Self {
        self.params = params;
        self.variadic = true;
        self
    }

    /// Set result variables.
    pub fn returns(mut self, results: Vec<Var>) -> Self {
        self.results = results;
        self
    }

    pub fn ty(&self) -> Type {
        Type::func(
            self.params.clone(),
            self.results.iter().map(|v| v.ty().clone()).collect(),
            self.variadic,
        )
    }

    pub fn num_in(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[Type] {
        &self.params
    }

    pub fn num_out(&self) -> usize {
        self.results.len()
    }

    /// The i'th result variable.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn out(&self, i: usize) -> &Var {
        &self.results[i]
    }

    pub fn results(&self) -> &[Var] {
        &self.results
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn is_unnamed_out(&self) -> bool {
        self.results.first().is_some_and(Var::is_unnamed_out)
    }
}

// =============================================================================
// DEFERRED PATCH
// =============================================================================

static NEXT_BUILDER_ID: AtomicU32 = AtomicU32::new(1);

/// Fresh identity for a builder, used to scope its `Reserved` handles.
pub fn next_builder_id() -> u32 {
    NEXT_BUILDER_ID.fetch_add(1, Ordering::Relaxed)
}

/// A reserved instruction position whose content is supplied later.
///
/// Obtained from [`Builder::reserve`] and consumed by [`Reserved::push`], so a
/// reservation cannot be resolved twice:
///
/// ```compile_fail
/// use goplus::bytecode::Builder;
/// use goplus::exec::Builder as _;
/// use goplus::exec::registry::Registry;
/// use goplus::lang::value::Value;
///
/// let mut b = Builder::new(Registry::builder().build());
/// let r = b.reserve();
/// r.push(&mut b, Value::Int(1));
/// r.push(&mut b, Value::Int(2));
/// ```
#[must_use = "a reserved position must be resolved exactly once"]
#[derive(Debug, PartialEq, Eq)]
pub struct Reserved {
    builder: u32,
    pos: usize,
}

impl Reserved {
    pub fn new(builder: u32, pos: usize) -> Self {
        Self { builder, pos }
    }

    /// Identity of the builder that issued this reservation.
    pub fn builder_id(&self) -> u32 {
        self.builder
    }

    /// Backend-specific position of the reserved slot.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Resolve the reservation as a push of `val`.
    pub fn push<B: Builder>(self, b: &mut B, val: Value) {
        b.reserved_as_push(self, val);
    }
}

// =============================================================================
// NATIVE PACKAGES
// =============================================================================

/// Kind of a symbol exported by a native package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Var,
    Func,
    /// Variadic function.
    Funcv,
}

/// Address of a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoFuncAddr(pub u32);

/// Address of a variadic native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoFuncvAddr(pub u32);

/// Address of a native variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoVarAddr(pub u32);

/// Identity of a native function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFuncInfo {
    pub pkg_path: String,
    pub name: String,
    pub ty: Type,
}

/// A constant exported by a native package.
#[derive(Debug, Clone, PartialEq)]
pub struct GoConstInfo {
    pub pkg_path: String,
    pub name: String,
    /// Bound kind, or an unbound marker for untyped constants.
    pub kind: Kind,
    pub value: Value,
}

/// A native package.
pub trait GoPackage: Send + Sync + fmt::Debug {
    fn pkg_path(&self) -> &str;

    /// Look up a function or variable by name.
    fn find(&self, name: &str) -> Option<(u32, SymbolKind)>;

    fn find_type(&self, name: &str) -> Option<Type>;

    fn find_const(&self, name: &str) -> Option<&GoConstInfo>;
}

// =============================================================================
// SOURCE MAPPING
// =============================================================================

/// Source position attached to a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: String,
    pub line: u32,
}

impl SourcePos {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// Marker returned by `start_stmt` and handed back to `end_stmt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StmtStart(pub usize);

// =============================================================================
// CODE / BUILDER / INTERFACE
// =============================================================================

/// Finalized instructions.
pub trait Code {
    /// Code length in backend units (instructions, lines, ...).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Instruction stream of one compilation unit.
///
/// Every emission method appends in program order and returns the builder so
/// calls can be chained. After [`Builder::resolve`] no further emission is
/// allowed.
pub trait Builder {
    type Code: Code;

    /// Push a constant.
    fn push(&mut self, val: Value) -> &mut Self;

    /// Discard `n` values.
    fn pop(&mut self, n: usize) -> &mut Self;

    /// Apply a built-in operator to operands of `kind`.
    fn builtin_op(&mut self, kind: Kind, op: Operator) -> &mut Self;

    /// Define `l` at the current position.
    fn label(&mut self, l: &Label) -> &mut Self;

    fn jmp(&mut self, l: &Label) -> &mut Self;

    /// Pop a bool and jump to `l` if it equals `cond`.
    fn jmp_if(&mut self, cond: bool, l: &Label) -> &mut Self;

    /// Compare the switch tag with the top `arity` case values; jump to `l` when
    /// none matches, otherwise pop the tag.
    fn case_ne(&mut self, l: &Label, arity: usize) -> &mut Self;

    /// Pop the switch tag.
    fn default_case(&mut self) -> &mut Self;

    fn for_phrase(
        &mut self,
        f: &ForPhrase,
        key: Option<&Var>,
        val: Option<&Var>,
        has_exec_ctx: bool,
    ) -> &mut Self;

    /// Pop a bool; skip the rest of the iteration when false.
    fn filter_for_phrase(&mut self, f: &ForPhrase) -> &mut Self;

    fn end_for_phrase(&mut self, f: &ForPhrase) -> &mut Self;

    fn list_comprehension(&mut self, c: &Comprehension) -> &mut Self;

    fn map_comprehension(&mut self, c: &Comprehension) -> &mut Self;

    fn end_comprehension(&mut self, c: &Comprehension) -> &mut Self;

    /// Push a closure over a declared function.
    fn closure(&mut self, fun: &FuncInfo) -> &mut Self;

    /// Push a closure usable as a native function value.
    fn go_closure(&mut self, fun: &FuncInfo) -> &mut Self;

    fn call_closure(&mut self, nexpr: usize, arity: i32, ellipsis: bool) -> &mut Self;

    fn call_go_closure(&mut self, nexpr: usize, arity: i32, ellipsis: bool) -> &mut Self;

    fn call_func(&mut self, fun: &FuncInfo, nexpr: usize) -> &mut Self;

    fn call_funcv(&mut self, fun: &FuncInfo, nexpr: usize, arity: i32) -> &mut Self;

    fn call_go_func(&mut self, fun: GoFuncAddr, nexpr: usize) -> &mut Self;

    fn call_go_funcv(&mut self, fun: GoFuncvAddr, nexpr: usize, arity: i32) -> &mut Self;

    /// Start the body of `fun`.
    fn define_func(&mut self, fun: &FuncInfo) -> &mut Self;

    fn return_(&mut self, n: i32) -> &mut Self;

    /// Load the argument at `idx`; parameter i of n has index `i - n`.
    fn load(&mut self, idx: i32) -> &mut Self;

    fn store(&mut self, idx: i32) -> &mut Self;

    /// Finish the body of `fun`.
    fn end_func(&mut self, fun: &FuncInfo) -> &mut Self;

    fn define_var(&mut self, vars: &[Var]) -> &mut Self;

    /// Whether `v` was defined by the function currently being emitted.
    fn in_current_ctx(&self, v: &Var) -> bool;

    fn load_var(&mut self, v: &Var) -> &mut Self;

    fn store_var(&mut self, v: &Var) -> &mut Self;

    fn addr_var(&mut self, v: &Var) -> &mut Self;

    fn addr_op(&mut self, kind: Kind, op: AddrOperator) -> &mut Self;

    fn append(&mut self, ty: &Type, arity: i32) -> &mut Self;

    fn make_array(&mut self, ty: &Type, arity: usize) -> &mut Self;

    fn make_map(&mut self, ty: &Type, arity: usize) -> &mut Self;

    /// `make(T, args...)` with `arity` size arguments.
    fn make(&mut self, ty: &Type, arity: usize) -> &mut Self;

    fn map_index(&mut self) -> &mut Self;

    fn set_map_index(&mut self) -> &mut Self;

    fn index(&mut self, idx: i32) -> &mut Self;

    fn set_index(&mut self, idx: i32) -> &mut Self;

    fn slice(&mut self, i: i32, j: i32) -> &mut Self;

    fn slice3(&mut self, i: i32, j: i32, k: i32) -> &mut Self;

    fn type_cast(&mut self, from: &Type, to: &Type) -> &mut Self;

    fn go_builtin(&mut self, ty: &Type, op: GoBuiltin) -> &mut Self;

    /// Push the zero value of `ty`.
    fn zero(&mut self, ty: &Type) -> &mut Self;

    fn start_stmt(&mut self, stmt: Option<&SourcePos>) -> StmtStart;

    fn end_stmt(&mut self, stmt: Option<&SourcePos>, start: StmtStart) -> &mut Self;

    /// Reserve a position whose content is decided later.
    fn reserve(&mut self) -> Reserved;

    /// Resolve `r` as `push(v)`. Prefer [`Reserved::push`].
    fn reserved_as_push(&mut self, r: Reserved, v: Value);

    fn global_interface(&self) -> &dyn Interface;

    /// Fix labels, reserved positions and forward references.
    fn resolve(&mut self) -> Self::Code;
}

/// Backend-global registry and handle factory.
///
/// Shared by every builder; only read after construction, apart from id
/// allocation, so it may be used from several threads.
pub trait Interface: Send + Sync {
    fn new_var(&self, ty: Type, name: &str) -> Var;

    fn new_label(&self, name: &str) -> Label;

    fn new_for_phrase(&self, container: Type) -> ForPhrase;

    fn new_comprehension(&self, out: Type) -> Comprehension;

    fn new_func(&self, name: &str, nest_depth: u32) -> FuncInfo;

    fn find_go_package(&self, pkg_path: &str) -> Option<Arc<dyn GoPackage>>;

    fn get_go_func_type(&self, addr: GoFuncAddr) -> Type;

    fn get_go_funcv_type(&self, addr: GoFuncvAddr) -> Type;

    fn get_go_func_info(&self, addr: GoFuncAddr) -> &GoFuncInfo;

    fn get_go_funcv_info(&self, addr: GoFuncvAddr) -> &GoFuncInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_out_var() {
        let v = Var::unnamed_out(1, Type::int(), 0);
        assert!(v.is_unnamed_out());
        assert_eq!(v.name(), "0");
        assert!(!Var::new(2, Type::int(), "n").is_unnamed_out());
    }

    #[test]
    fn test_func_info_type() {
        let f = FuncInfo::new(1, "div", 0)
            .args(vec![Type::int(), Type::int()])
            .returns(vec![
                Var::unnamed_out(2, Type::int(), 0),
                Var::unnamed_out(3, Type::bool(), 1),
            ]);

        assert_eq!(f.num_in(), 2);
        assert_eq!(f.num_out(), 2);
        assert_eq!(f.out(1).ty(), &Type::bool());
        assert!(f.is_unnamed_out());
        assert!(!f.is_variadic());
        assert_eq!(f.ty().to_string(), "func(int, int) (int, bool)");
    }

    #[test]
    fn test_func_info_vargs() {
        let f = FuncInfo::new(1, "sum", 0).vargs(vec![Type::slice(Type::int())]);
        assert!(f.is_variadic());
        assert!(f.ty().is_variadic());
        assert_eq!(f.ty().to_string(), "func(...int)");
    }

    #[test]
    fn test_builder_ids_are_unique() {
        let a = next_builder_id();
        let b = next_builder_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_reserved_accessors() {
        let r = Reserved::new(7, 3);
        assert_eq!(r.builder_id(), 7);
        assert_eq!(r.pos(), 3);
    }
}
