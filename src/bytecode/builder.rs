use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::bytecode::ir::{Code, FuncEntry, StmtSpan};
use crate::bytecode::op::{Op, VarRef};
use crate::cl::internal_error;
use crate::exec::kind::Kind;
use crate::exec::operator::{AddrOperator, GoBuiltin, Operator};
use crate::exec::spec::{
    self, Comprehension, ForPhrase, FuncInfo, GoFuncAddr, GoFuncvAddr, Interface, Label,
    Reserved, SourcePos, StmtStart, Var, next_builder_id,
};
use crate::exec::types::Type;
use crate::lang::value::Value;

/// Variable slots of one function body, or of the top level.
struct Frame {
    func: Option<u32>,
    /// The jump that steps over the body when control reaches its definition.
    skip: usize,
    vars: HashMap<u32, u32>,
    num_vars: u32,
}

impl Frame {
    fn new(func: Option<u32>, skip: usize) -> Self {
        Self {
            func,
            skip,
            vars: HashMap::new(),
            num_vars: 0,
        }
    }

    fn define(&mut self, v: &Var) {
        if self.vars.contains_key(&v.id()) {
            internal_error(format!("variable `{}` defined twice", v.name()));
        }
        self.vars.insert(v.id(), self.num_vars);
        self.num_vars += 1;
    }
}

struct ForState {
    start: usize,
    filters: Vec<usize>,
}

/// Emits a flat bytecode stream.
///
/// Function bodies may be emitted anywhere: each is preceded by a jump over
/// it. Jumps to labels are patched in [`spec::Builder::resolve`].
pub struct Builder {
    id: u32,
    iface: Arc<dyn Interface>,
    ops: Vec<Op>,
    labels: HashMap<u32, usize>,
    label_names: HashMap<u32, String>,
    fixups: Vec<(usize, u32)>,
    pending: HashSet<usize>,
    frames: Vec<Frame>,
    funcs: Vec<FuncEntry>,
    for_phrases: HashMap<u32, ForState>,
    comprehensions: Vec<u32>,
    spans: Vec<StmtSpan>,
    resolved: bool,
}

impl Builder {
    pub fn new(iface: Arc<dyn Interface>) -> Self {
        Self {
            id: next_builder_id(),
            iface,
            ops: Vec::new(),
            labels: HashMap::new(),
            label_names: HashMap::new(),
            fixups: Vec::new(),
            pending: HashSet::new(),
            frames: vec![Frame::new(None, 0)],
            funcs: Vec::new(),
            for_phrases: HashMap::new(),
            comprehensions: Vec::new(),
            spans: Vec::new(),
            resolved: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Instructions emitted so far.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Reserved positions not resolved yet.
    pub fn pending_reservations(&self) -> usize {
        self.pending.len()
    }

    fn check_open(&self, what: &str) {
        if self.resolved {
            internal_error(format!("{} after resolve", what));
        }
    }

    fn emit(&mut self, op: Op) -> &mut Self {
        self.check_open("emission");
        tracing::trace!(builder = self.id, ip = self.ops.len(), op = ?op, "emit");
        self.ops.push(op);
        self
    }

    fn emit_jump(&mut self, l: &Label, op: Op) -> &mut Self {
        self.label_names
            .entry(l.id())
            .or_insert_with(|| l.name().to_string());
        self.fixups.push((self.ops.len(), l.id()));
        self.emit(op)
    }

    fn var_ref(&self, v: &Var) -> VarRef {
        for (scope, frame) in self.frames.iter().rev().enumerate() {
            if let Some(&slot) = frame.vars.get(&v.id()) {
                return VarRef {
                    scope: scope as u32,
                    slot,
                };
            }
        }
        internal_error(format!("variable `{}` used before define_var", v.name()))
    }

    fn frame(&mut self) -> &mut Frame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => internal_error("builder has no frame"),
        }
    }
}

impl spec::Builder for Builder {
    type Code = Code;

    fn push(&mut self, val: Value) -> &mut Self {
        self.emit(Op::Push(val))
    }

    fn pop(&mut self, n: usize) -> &mut Self {
        self.emit(Op::Pop(n))
    }

    fn builtin_op(&mut self, kind: Kind, op: Operator) -> &mut Self {
        self.emit(Op::BuiltinOp(kind, op))
    }

    fn label(&mut self, l: &Label) -> &mut Self {
        self.check_open("label");
        if self.labels.insert(l.id(), self.ops.len()).is_some() {
            internal_error(format!("label `{}` defined twice", l.name()));
        }
        self.label_names
            .entry(l.id())
            .or_insert_with(|| l.name().to_string());
        self
    }

    fn jmp(&mut self, l: &Label) -> &mut Self {
        self.emit_jump(l, Op::Jump(0))
    }

    fn jmp_if(&mut self, cond: bool, l: &Label) -> &mut Self {
        self.emit_jump(l, Op::JumpIf { cond, offset: 0 })
    }

    fn case_ne(&mut self, l: &Label, arity: usize) -> &mut Self {
        self.emit_jump(l, Op::CaseNE { offset: 0, arity })
    }

    fn default_case(&mut self) -> &mut Self {
        self.emit(Op::Default)
    }

    fn for_phrase(
        &mut self,
        f: &ForPhrase,
        key: Option<&Var>,
        val: Option<&Var>,
        has_exec_ctx: bool,
    ) -> &mut Self {
        let key = key.map(|v| self.var_ref(v));
        let val = val.map(|v| self.var_ref(v));
        let state = ForState {
            start: self.ops.len(),
            filters: Vec::new(),
        };
        if self.for_phrases.insert(f.id(), state).is_some() {
            internal_error(format!("for phrase {} started twice", f.id()));
        }
        self.emit(Op::ForPhrase {
            key,
            val,
            has_exec_ctx,
            exit: 0,
        })
    }

    fn filter_for_phrase(&mut self, f: &ForPhrase) -> &mut Self {
        let ip = self.ops.len();
        match self.for_phrases.get_mut(&f.id()) {
            Some(state) => state.filters.push(ip),
            None => internal_error(format!("filter outside for phrase {}", f.id())),
        }
        self.emit(Op::FilterForPhrase(0))
    }

    fn end_for_phrase(&mut self, f: &ForPhrase) -> &mut Self {
        let state = match self.for_phrases.remove(&f.id()) {
            Some(state) => state,
            None => internal_error(format!("end of for phrase {} that was not started", f.id())),
        };
        let end = self.ops.len();
        self.emit(Op::EndForPhrase(state.start as i32 - end as i32));
        for ip in state.filters {
            Op::patch_jump(&mut self.ops, ip, end);
        }
        Op::patch_jump(&mut self.ops, state.start, end + 1);
        self
    }

    fn list_comprehension(&mut self, c: &Comprehension) -> &mut Self {
        self.comprehensions.push(c.id());
        self.emit(Op::ListComprehension(c.out().clone()))
    }

    fn map_comprehension(&mut self, c: &Comprehension) -> &mut Self {
        self.comprehensions.push(c.id());
        self.emit(Op::MapComprehension(c.out().clone()))
    }

    fn end_comprehension(&mut self, c: &Comprehension) -> &mut Self {
        if self.comprehensions.pop() != Some(c.id()) {
            internal_error(format!("end of comprehension {} does not match its start", c.id()));
        }
        self.emit(Op::EndComprehension)
    }

    fn closure(&mut self, fun: &FuncInfo) -> &mut Self {
        self.emit(Op::Closure(fun.id()))
    }

    fn go_closure(&mut self, fun: &FuncInfo) -> &mut Self {
        self.emit(Op::GoClosure(fun.id()))
    }

    fn call_closure(&mut self, nexpr: usize, arity: i32, ellipsis: bool) -> &mut Self {
        self.emit(Op::CallClosure {
            nexpr,
            arity,
            ellipsis,
        })
    }

    fn call_go_closure(&mut self, nexpr: usize, arity: i32, ellipsis: bool) -> &mut Self {
        self.emit(Op::CallGoClosure {
            nexpr,
            arity,
            ellipsis,
        })
    }

    fn call_func(&mut self, fun: &FuncInfo, nexpr: usize) -> &mut Self {
        self.emit(Op::CallFunc {
            func: fun.id(),
            nexpr,
        })
    }

    fn call_funcv(&mut self, fun: &FuncInfo, nexpr: usize, arity: i32) -> &mut Self {
        self.emit(Op::CallFuncv {
            func: fun.id(),
            nexpr,
            arity,
        })
    }

    fn call_go_func(&mut self, fun: GoFuncAddr, nexpr: usize) -> &mut Self {
        self.emit(Op::CallGoFunc { addr: fun, nexpr })
    }

    fn call_go_funcv(&mut self, fun: GoFuncvAddr, nexpr: usize, arity: i32) -> &mut Self {
        self.emit(Op::CallGoFuncv {
            addr: fun,
            nexpr,
            arity,
        })
    }

    fn define_func(&mut self, fun: &FuncInfo) -> &mut Self {
        if self.funcs.iter().any(|f| f.id == fun.id())
            || self.frames.iter().any(|f| f.func == Some(fun.id()))
        {
            internal_error(format!("function `{}` defined twice", fun.name()));
        }
        let skip = self.ops.len();
        self.emit(Op::Jump(0));

        let mut frame = Frame::new(Some(fun.id()), skip);
        for v in fun.results() {
            frame.define(v);
        }
        tracing::debug!(func = fun.name(), entry = skip + 1, "function body started");
        self.frames.push(frame);
        self
    }

    fn return_(&mut self, n: i32) -> &mut Self {
        self.emit(Op::Return(n))
    }

    fn load(&mut self, idx: i32) -> &mut Self {
        self.emit(Op::Load(idx))
    }

    fn store(&mut self, idx: i32) -> &mut Self {
        self.emit(Op::Store(idx))
    }

    fn end_func(&mut self, fun: &FuncInfo) -> &mut Self {
        self.check_open("end_func");
        let open = self.frames.last().and_then(|f| f.func);
        if self.frames.len() < 2 || open != Some(fun.id()) {
            internal_error(format!("end_func(`{}`) does not match the open function", fun.name()));
        }
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => internal_error("builder has no frame"),
        };
        let end = self.ops.len();
        Op::patch_jump(&mut self.ops, frame.skip, end);
        self.funcs.push(FuncEntry {
            id: fun.id(),
            name: fun.name().to_string(),
            entry: frame.skip + 1,
            end,
            num_in: fun.num_in(),
            num_out: fun.num_out(),
            variadic: fun.is_variadic(),
            num_vars: frame.num_vars,
        });
        self
    }

    fn define_var(&mut self, vars: &[Var]) -> &mut Self {
        self.check_open("define_var");
        let frame = self.frame();
        for v in vars {
            frame.define(v);
        }
        self
    }

    fn in_current_ctx(&self, v: &Var) -> bool {
        self.frames
            .last()
            .is_some_and(|f| f.vars.contains_key(&v.id()))
    }

    fn load_var(&mut self, v: &Var) -> &mut Self {
        let r = self.var_ref(v);
        self.emit(Op::LoadVar(r))
    }

    fn store_var(&mut self, v: &Var) -> &mut Self {
        let r = self.var_ref(v);
        self.emit(Op::StoreVar(r))
    }

    fn addr_var(&mut self, v: &Var) -> &mut Self {
        let r = self.var_ref(v);
        self.emit(Op::AddrVar(r))
    }

    fn addr_op(&mut self, kind: Kind, op: AddrOperator) -> &mut Self {
        self.emit(Op::AddrOp(kind, op))
    }

    fn append(&mut self, ty: &Type, arity: i32) -> &mut Self {
        self.emit(Op::Append {
            ty: ty.clone(),
            arity,
        })
    }

    fn make_array(&mut self, ty: &Type, arity: usize) -> &mut Self {
        self.emit(Op::MakeArray {
            ty: ty.clone(),
            arity,
        })
    }

    fn make_map(&mut self, ty: &Type, arity: usize) -> &mut Self {
        self.emit(Op::MakeMap {
            ty: ty.clone(),
            arity,
        })
    }

    fn make(&mut self, ty: &Type, arity: usize) -> &mut Self {
        self.emit(Op::Make {
            ty: ty.clone(),
            arity,
        })
    }

    fn map_index(&mut self) -> &mut Self {
        self.emit(Op::MapIndex)
    }

    fn set_map_index(&mut self) -> &mut Self {
        self.emit(Op::SetMapIndex)
    }

    fn index(&mut self, idx: i32) -> &mut Self {
        self.emit(Op::Index(idx))
    }

    fn set_index(&mut self, idx: i32) -> &mut Self {
        self.emit(Op::SetIndex(idx))
    }

    fn slice(&mut self, i: i32, j: i32) -> &mut Self {
        self.emit(Op::Slice(i, j))
    }

    fn slice3(&mut self, i: i32, j: i32, k: i32) -> &mut Self {
        self.emit(Op::Slice3(i, j, k))
    }

    fn type_cast(&mut self, from: &Type, to: &Type) -> &mut Self {
        self.emit(Op::TypeCast {
            from: from.clone(),
            to: to.clone(),
        })
    }

    fn go_builtin(&mut self, ty: &Type, op: GoBuiltin) -> &mut Self {
        self.emit(Op::GoBuiltin(ty.clone(), op))
    }

    fn zero(&mut self, ty: &Type) -> &mut Self {
        self.emit(Op::Zero(ty.clone()))
    }

    fn start_stmt(&mut self, _stmt: Option<&SourcePos>) -> StmtStart {
        self.check_open("start_stmt");
        StmtStart(self.ops.len())
    }

    fn end_stmt(&mut self, stmt: Option<&SourcePos>, start: StmtStart) -> &mut Self {
        self.check_open("end_stmt");
        if let Some(pos) = stmt {
            self.spans.push(StmtSpan {
                start: start.0,
                end: self.ops.len(),
                pos: pos.clone(),
            });
        }
        self
    }

    fn reserve(&mut self) -> Reserved {
        let pos = self.ops.len();
        self.emit(Op::Reserved);
        self.pending.insert(pos);
        Reserved::new(self.id, pos)
    }

    fn reserved_as_push(&mut self, r: Reserved, v: Value) {
        self.check_open("resolving a reserved position");
        if r.builder_id() != self.id {
            internal_error(format!(
                "reserved position {} of builder {} resolved on builder {}",
                r.pos(),
                r.builder_id(),
                self.id
            ));
        }
        if !self.pending.remove(&r.pos()) {
            internal_error(format!("reserved position {} resolved twice", r.pos()));
        }
        tracing::trace!(builder = self.id, ip = r.pos(), value = ?v, "reserved position filled");
        self.ops[r.pos()] = Op::Push(v);
    }

    fn global_interface(&self) -> &dyn Interface {
        self.iface.as_ref()
    }

    fn resolve(&mut self) -> Code {
        self.check_open("resolve");
        if let Some(pos) = self.pending.iter().min() {
            internal_error(format!(
                "{} reserved position(s) unresolved, first at {}",
                self.pending.len(),
                pos
            ));
        }
        if let Some(frame) = self.frames.get(1) {
            internal_error(format!("function {:?} has no end_func", frame.func));
        }
        if let Some(id) = self.for_phrases.keys().next() {
            internal_error(format!("for phrase {} has no end_for_phrase", id));
        }
        if let Some(id) = self.comprehensions.last() {
            internal_error(format!("comprehension {} has no end_comprehension", id));
        }
        for &(ip, label) in &self.fixups {
            let target = match self.labels.get(&label) {
                Some(&target) => target,
                None => internal_error(format!(
                    "label `{}` used but never defined",
                    self.label_names.get(&label).map_or("?", String::as_str)
                )),
            };
            Op::patch_jump(&mut self.ops, ip, target);
        }

        self.resolved = true;
        let code = Code {
            ops: std::mem::take(&mut self.ops),
            funcs: std::mem::take(&mut self.funcs),
            spans: std::mem::take(&mut self.spans),
            num_vars: self.frames[0].num_vars,
        };
        tracing::debug!(builder = self.id, len = code.ops.len(), funcs = code.funcs.len(), "bytecode resolved");
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Code as _;
    use crate::exec::registry::Registry;
    use crate::exec::spec::{Builder as _, RETURN_NAMED_RESULTS};

    fn setup() -> (Arc<Registry>, Builder) {
        let reg = Registry::builder()
            .package("fmt", |p| {
                p.funcv(
                    "Println",
                    Type::func(vec![Type::slice(Type::empty_interface())], vec![Type::int()], true),
                );
            })
            .build();
        let b = Builder::new(reg.clone());
        (reg, b)
    }

    #[test]
    fn test_fluent_emission() {
        let (reg, mut b) = setup();
        let println = reg.package("fmt").unwrap().find_funcv("Println").unwrap();

        b.push(Value::Int(1))
            .push(Value::Int(2))
            .builtin_op(Kind::Int, Operator::Add)
            .call_go_funcv(println, 1, 1)
            .pop(1);
        let code = b.resolve();

        assert_eq!(code.len(), 5);
        assert_eq!(code.ops()[2], Op::BuiltinOp(Kind::Int, Operator::Add));
        assert!(matches!(code.ops()[3], Op::CallGoFuncv { nexpr: 1, arity: 1, .. }));
    }

    #[test]
    fn test_forward_and_backward_jumps() {
        let (reg, mut b) = setup();
        let top = reg.new_label("top");
        let done = reg.new_label("done");

        b.label(&top)
            .push(Value::Bool(true))
            .jmp_if(false, &done)
            .jmp(&top)
            .label(&done);
        let code = b.resolve();

        assert_eq!(code.ops()[1], Op::JumpIf { cond: false, offset: 2 });
        assert_eq!(code.ops()[2], Op::Jump(-2));
    }

    #[test]
    fn test_reserved_position_filled_in_order() {
        let (_, mut b) = setup();
        b.push(Value::Int(1));
        let r = b.reserve();
        b.builtin_op(Kind::Float32, Operator::Mul);
        assert_eq!(b.pending_reservations(), 1);

        r.push(&mut b, Value::Float32(2.0));
        let code = b.resolve();

        assert_eq!(code.ops()[1], Op::Push(Value::Float32(2.0)));
        assert!(!code.ops().contains(&Op::Reserved));
    }

    #[test]
    #[should_panic(expected = "unresolved")]
    fn test_resolve_with_outstanding_reservation() {
        let (_, mut b) = setup();
        let _r = b.reserve();
        b.resolve();
    }

    #[test]
    #[should_panic(expected = "resolved twice")]
    fn test_forged_double_resolution() {
        let (_, mut b) = setup();
        let r = b.reserve();
        let forged = Reserved::new(r.builder_id(), r.pos());
        r.push(&mut b, Value::Int(1));
        forged.push(&mut b, Value::Int(2));
    }

    #[test]
    #[should_panic(expected = "resolved on builder")]
    fn test_foreign_reservation() {
        let (reg, mut a) = setup();
        let mut other = Builder::new(reg);
        let r = a.reserve();
        r.push(&mut other, Value::Int(1));
    }

    #[test]
    #[should_panic(expected = "emission after resolve")]
    fn test_emission_after_resolve() {
        let (_, mut b) = setup();
        b.resolve();
        b.push(Value::Int(1));
    }

    #[test]
    #[should_panic(expected = "never defined")]
    fn test_undefined_label() {
        let (reg, mut b) = setup();
        b.jmp(&reg.new_label("nowhere"));
        b.resolve();
    }

    #[test]
    fn test_function_body_is_skipped() {
        let (reg, mut b) = setup();
        let n = reg.new_var(Type::int(), "n");
        let fun = reg
            .new_func("double", 0)
            .args(vec![Type::int()])
            .returns(vec![n.clone()]);

        b.define_func(&fun)
            .load(-1)
            .push(Value::Int(2))
            .builtin_op(Kind::Int, Operator::Mul)
            .store_var(&n)
            .return_(RETURN_NAMED_RESULTS)
            .end_func(&fun)
            .push(Value::Int(21))
            .call_func(&fun, 1);
        let code = b.resolve();

        assert_eq!(code.ops()[0], Op::Jump(6));
        let entry = code.func(fun.id()).unwrap();
        assert_eq!((entry.entry, entry.end), (1, 6));
        assert_eq!(entry.num_vars, 1);
        assert_eq!(code.ops()[4], Op::StoreVar(VarRef { scope: 0, slot: 0 }));
    }

    #[test]
    fn test_closure_sees_outer_variable() {
        let (reg, mut b) = setup();
        let x = reg.new_var(Type::int(), "x");
        let fun = reg.new_func("inc", 1);

        b.define_var(std::slice::from_ref(&x));
        assert!(b.in_current_ctx(&x));
        b.define_func(&fun);
        assert!(!b.in_current_ctx(&x));
        b.addr_var(&x)
            .addr_op(Kind::Int, AddrOperator::Inc)
            .return_(0)
            .end_func(&fun)
            .closure(&fun);
        let code = b.resolve();

        assert_eq!(code.ops()[1], Op::AddrVar(VarRef { scope: 1, slot: 0 }));
        assert_eq!(code.num_vars(), 1);
    }

    #[test]
    #[should_panic(expected = "used before define_var")]
    fn test_undefined_variable() {
        let (reg, mut b) = setup();
        b.load_var(&reg.new_var(Type::int(), "ghost"));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_unbalanced_end_func() {
        let (reg, mut b) = setup();
        b.end_func(&reg.new_func("f", 0));
    }

    #[test]
    fn test_for_phrase_with_filter() {
        let (reg, mut b) = setup();
        let v = reg.new_var(Type::int(), "v");
        let f = reg.new_for_phrase(Type::slice(Type::int()));
        let c = reg.new_comprehension(Type::slice(Type::int()));

        b.define_var(std::slice::from_ref(&v))
            .list_comprehension(&c)
            .load_var(&v) // container
            .for_phrase(&f, None, Some(&v), true)
            .load_var(&v)
            .push(Value::Int(0))
            .builtin_op(Kind::Int, Operator::GT)
            .filter_for_phrase(&f)
            .load_var(&v)
            .end_for_phrase(&f)
            .end_comprehension(&c);
        let code = b.resolve();

        assert!(matches!(code.ops()[2], Op::ForPhrase { exit: 7, .. }));
        assert_eq!(code.ops()[6], Op::FilterForPhrase(2));
        assert_eq!(code.ops()[8], Op::EndForPhrase(-6));
        assert_eq!(code.ops()[9], Op::EndComprehension);
    }

    #[test]
    fn test_switch_cases() {
        let (reg, mut b) = setup();
        let next = reg.new_label("next");
        let done = reg.new_label("done");

        b.push(Value::Int(3))
            .push(Value::Int(1))
            .push(Value::Int(2))
            .case_ne(&next, 2)
            .jmp(&done)
            .label(&next)
            .default_case()
            .label(&done);
        let code = b.resolve();

        assert_eq!(code.ops()[3], Op::CaseNE { offset: 2, arity: 2 });
        assert_eq!(code.ops()[4], Op::Jump(2));
    }

    #[test]
    fn test_statement_spans() {
        let (_, mut b) = setup();
        let pos = SourcePos::new("main.gop", 3);

        let start = b.start_stmt(Some(&pos));
        b.push(Value::Int(1)).pop(1);
        b.end_stmt(Some(&pos), start);
        let start = b.start_stmt(None);
        b.push(Value::Int(2)).pop(1);
        b.end_stmt(None, start);
        let code = b.resolve();

        assert_eq!(code.spans().len(), 1);
        assert_eq!(code.pos_at(1), Some(&pos));
        assert_eq!(code.pos_at(2), None);
    }

    #[test]
    fn test_composite_ops() {
        let (_, mut b) = setup();
        let ty = Type::map(Type::string(), Type::int());

        b.push(Value::String("a".into()))
            .push(Value::Int(1))
            .make_map(&ty, 1)
            .push(Value::String("a".into()))
            .map_index()
            .zero(&Type::int())
            .slice(crate::exec::SLICE_DEFAULT, 2)
            .go_builtin(&Type::slice(Type::int()), GoBuiltin::Len);
        let code = b.resolve();

        assert_eq!(code.ops()[2], Op::MakeMap { ty, arity: 1 });
        assert_eq!(code.ops()[6], Op::Slice(-2, 2));
    }

    #[test]
    fn test_global_interface_is_shared() {
        let (reg, b) = setup();
        let fmt = b.global_interface().find_go_package("fmt").unwrap();
        assert_eq!(fmt.pkg_path(), "fmt");
        assert!(reg.find_go_package("fmt").is_some());
    }
}
