use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::cl::internal_error;
use crate::exec::kind::Kind;
use crate::exec::operator::{AddrOperator, GoBuiltin, Operator};
use crate::exec::spec::Builder as _;
use crate::exec::spec::{
    self, ARITY_ELLIPSIS, Comprehension, ForPhrase, FuncInfo, GoFuncAddr, GoFuncInfo, GoFuncvAddr,
    Interface, Label, RETURN_NAMED_RESULTS, Reserved, SLICE_DEFAULT, SLICE_FROM_STACK, SourcePos,
    StmtStart, Var, next_builder_id,
};
use crate::exec::types::Type;
use crate::golang::expr::{Expr, PRIMARY, Segment, UNARY, go_literal, render, zero_literal};
use crate::golang::{Code, Options};
use crate::lang::value::Value;

// =============================================================================
// FRAMES
// =============================================================================

#[derive(Debug, Clone)]
struct Line {
    indent: usize,
    segs: Vec<Segment>,
}

struct FuncFrame {
    fun: Option<FuncInfo>,
    lines: Vec<Line>,
    /// Block depth inside the body; 1 is the body itself.
    depth: usize,
    vars: HashSet<u32>,
}

impl FuncFrame {
    fn new(fun: Option<FuncInfo>) -> Self {
        Self {
            fun,
            lines: Vec::new(),
            depth: 1,
            vars: HashSet::new(),
        }
    }
}

struct ForState {
    stack_depth: usize,
}

struct CompState {
    id: u32,
    var: String,
    is_map: bool,
}

struct StmtState {
    stack_depth: usize,
    line: usize,
}

/// Renders the instruction stream as Go source.
///
/// Values are kept on a stack of expression fragments; statements are
/// written when a value is stored, discarded or ends its statement. A
/// reserved constant is a hole in a fragment, filled when it is resolved.
pub struct Builder {
    id: u32,
    iface: Arc<dyn Interface>,
    options: Options,
    stack: Vec<Expr>,
    slots: Vec<Option<String>>,
    frames: Vec<FuncFrame>,
    /// Rendered package-level functions, in definition order.
    funcs: Vec<Vec<Line>>,
    /// Function literals of nested functions, by function id.
    closures: HashMap<u32, Expr>,
    imports: BTreeMap<String, String>,
    fors: HashMap<u32, ForState>,
    comps: Vec<CompState>,
    stmts: Vec<StmtState>,
    temps: usize,
    resolved: bool,
}

impl Builder {
    pub fn new(iface: Arc<dyn Interface>, options: Options) -> Self {
        Self {
            id: next_builder_id(),
            iface,
            options,
            stack: Vec::new(),
            slots: Vec::new(),
            frames: vec![FuncFrame::new(None)],
            funcs: Vec::new(),
            closures: HashMap::new(),
            imports: BTreeMap::new(),
            fors: HashMap::new(),
            comps: Vec::new(),
            stmts: Vec::new(),
            temps: 0,
            resolved: false,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Expressions waiting on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn check_open(&self, what: &str) {
        if self.resolved {
            internal_error(format!("{} after resolve", what));
        }
    }

    fn frame(&mut self) -> &mut FuncFrame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => internal_error("builder has no frame"),
        }
    }

    fn pop_expr(&mut self) -> Expr {
        match self.stack.pop() {
            Some(e) => e,
            None => internal_error("expression stack underflow"),
        }
    }

    fn pop_n(&mut self, n: usize) -> Vec<Expr> {
        if n > self.stack.len() {
            internal_error(format!("need {} expressions, stack has {}", n, self.stack.len()));
        }
        self.stack.split_off(self.stack.len() - n)
    }

    fn push_expr(&mut self, e: Expr) -> &mut Self {
        self.check_open("emission");
        self.stack.push(e);
        self
    }

    fn line(&mut self, e: Expr) -> &mut Self {
        self.check_open("emission");
        let frame = self.frame();
        let indent = frame.depth;
        frame.lines.push(Line { indent, segs: e.segs });
        self
    }

    fn text_line(&mut self, s: impl Into<String>) -> &mut Self {
        self.line(Expr::primary(s))
    }

    fn open_block(&mut self, header: Expr) {
        self.line(header);
        self.frame().depth += 1;
    }

    fn close_block(&mut self) {
        let frame = self.frame();
        frame.depth -= 1;
        self.text_line("}");
    }

    /// Emit a value nobody consumes.
    fn discard(&mut self, e: Expr) {
        if e.is_call {
            self.line(e);
        } else {
            let mut stmt = Expr::primary("_ = ");
            stmt.push_expr(e);
            self.line(stmt);
        }
    }

    fn temp(&mut self, prefix: &str) -> String {
        let name = format!("_gop_{}{}", prefix, self.temps);
        self.temps += 1;
        name
    }

    fn import(&mut self, pkg_path: &str) -> String {
        if let Some(alias) = self.imports.get(pkg_path) {
            return alias.clone();
        }
        let base: String = pkg_path
            .rsplit('/')
            .next()
            .unwrap_or(pkg_path)
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let mut alias = base.clone();
        let mut n = 1;
        while self.imports.values().any(|a| *a == alias) {
            n += 1;
            alias = format!("{}{}", base, n);
        }
        self.imports.insert(pkg_path.to_string(), alias.clone());
        alias
    }

    fn qualified(&mut self, info: &GoFuncInfo) -> String {
        if info.pkg_path.is_empty() {
            return info.name.clone();
        }
        let alias = self.import(&info.pkg_path);
        format!("{}.{}", alias, info.name)
    }

    fn type_expr(&mut self, t: &Type) -> String {
        if let Some((pkg_path, name)) = t.name() {
            if pkg_path.is_empty() || pkg_path == self.options.package {
                return name.to_string();
            }
            let alias = self.import(pkg_path);
            return format!("{}.{}", alias, name);
        }
        match t.kind() {
            Kind::Array => {
                let elem = self.type_expr(&part(t.elem(), t));
                format!("[{}]{}", t.array_len().unwrap_or(0), elem)
            }
            Kind::Slice => format!("[]{}", self.type_expr(&part(t.elem(), t))),
            Kind::Ptr => format!("*{}", self.type_expr(&part(t.elem(), t))),
            Kind::Chan => format!("chan {}", self.type_expr(&part(t.elem(), t))),
            Kind::Map => {
                let key = self.type_expr(&part(t.key(), t));
                let elem = self.type_expr(&part(t.elem(), t));
                format!("map[{}]{}", key, elem)
            }
            Kind::Func => {
                let params: Vec<String> = (0..t.num_in()).map(|i| self.param_type(t, i)).collect();
                let results: Vec<String> = (0..t.num_out()).map(|i| self.type_expr(&t.out(i))).collect();
                format!("func({}){}", params.join(", "), results_suffix(&results))
            }
            Kind::Struct => {
                let fields = t.fields().unwrap_or_default();
                if fields.is_empty() {
                    return "struct{}".to_string();
                }
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} {}", f.name, self.type_expr(&f.ty)))
                    .collect();
                format!("struct {{ {} }}", fields.join("; "))
            }
            Kind::Interface => "interface{}".to_string(),
            Kind::UnsafePointer => {
                let alias = self.import("unsafe");
                format!("{}.Pointer", alias)
            }
            kind => kind.name().to_string(),
        }
    }

    fn param_type(&mut self, tfn: &Type, i: usize) -> String {
        let t = tfn.in_(i);
        if tfn.is_variadic() && i + 1 == tfn.num_in() {
            format!("...{}", self.type_expr(&part(t.elem(), &t)))
        } else {
            self.type_expr(&t)
        }
    }

    fn var_name(v: &Var) -> String {
        if v.is_unnamed_out() {
            format!("_ret{}", v.name())
        } else {
            v.name().to_string()
        }
    }

    fn arg_name(&self, idx: i32) -> String {
        let n = self
            .frames
            .last()
            .and_then(|f| f.fun.as_ref())
            .map_or(0, FuncInfo::num_in) as i32;
        let i = n + idx;
        if i < 0 || i >= n {
            internal_error(format!("argument index {} of a {}-parameter function", idx, n));
        }
        format!("arg{}", i)
    }

    fn signature(&mut self, fun: &FuncInfo) -> String {
        let tfn = fun.ty();
        let params: Vec<String> = (0..fun.num_in())
            .map(|i| format!("arg{} {}", i, self.param_type(&tfn, i)))
            .collect();
        let results: Vec<String> = if fun.is_unnamed_out() {
            fun.results().iter().map(|v| self.type_expr(v.ty())).collect()
        } else {
            let named: Vec<String> = fun
                .results()
                .iter()
                .map(|v| format!("{} {}", Self::var_name(v), self.type_expr(v.ty())))
                .collect();
            if named.is_empty() { named } else { vec![format!("({})", named.join(", "))] }
        };
        format!("func({}){}", params.join(", "), results_suffix(&results))
    }

    fn call_go(&mut self, info: GoFuncInfo, nexpr: usize, arity: i32) -> &mut Self {
        let args = self.pop_n(nexpr);
        let head = Expr::primary(self.qualified(&info));
        self.push_expr(Expr::call(head, args, arity == ARITY_ELLIPSIS))
    }

    fn slice_bound(&mut self, b: i32) -> Option<Expr> {
        match b {
            SLICE_DEFAULT => None,
            SLICE_FROM_STACK => Some(self.pop_expr()),
            b => Some(Expr::primary(b.to_string())),
        }
    }

    fn slice_expr(&mut self, bounds: Vec<i32>) -> &mut Self {
        // Bounds were pushed low to high, so they come off in reverse.
        let mut parts: Vec<Option<Expr>> = bounds.iter().rev().map(|&b| self.slice_bound(b)).collect();
        parts.reverse();
        let x = self.pop_expr();
        let mut e = Expr::new(PRIMARY);
        e.push_operand(x, PRIMARY).push_str("[");
        for (i, p) in parts.into_iter().enumerate() {
            if i > 0 {
                e.push_str(":");
            }
            if let Some(p) = p {
                e.push_expr(p);
            }
        }
        e.push_str("]");
        self.push_expr(e)
    }

    fn index_expr(&mut self, idx: i32) -> (Expr, Expr) {
        let index = if idx < 0 {
            self.pop_expr()
        } else {
            Expr::primary(idx.to_string())
        };
        let x = self.pop_expr();
        (x, index)
    }

    fn render_lines(&self, lines: &[Line], base: usize, out: &mut String) {
        for line in lines {
            if !matches!(line.segs.first(), Some(Segment::Text(s)) if s.starts_with("//line ")) {
                out.push_str(&"\t".repeat(base + line.indent));
            }
            render(&line.segs, &self.slots, out);
            out.push('\n');
        }
    }

    fn render_source(&self) -> String {
        let mut out = format!("package {}\n\n", self.options.package);
        match self.imports.len() {
            0 => {}
            1 => {
                for (path, alias) in &self.imports {
                    out.push_str(&format!("import {} \"{}\"\n\n", alias, path));
                }
            }
            _ => {
                out.push_str("import (\n");
                for (path, alias) in &self.imports {
                    out.push_str(&format!("\t{} \"{}\"\n", alias, path));
                }
                out.push_str(")\n\n");
            }
        }
        for f in &self.funcs {
            self.render_lines(f, 0, &mut out);
            out.push('\n');
        }
        out.push_str(&format!("func {}() {{\n", self.options.main_func));
        self.render_lines(&self.frames[0].lines, 0, &mut out);
        out.push_str("}\n");
        out.replace('\t', &self.options.indent)
    }
}

fn part(t: Option<Type>, of: &Type) -> Type {
    t.unwrap_or_else(|| internal_error(format!("type {} has no element type", of)))
}

fn results_suffix(results: &[String]) -> String {
    match results.len() {
        0 => String::new(),
        1 => format!(" {}", results[0]),
        _ => format!(" ({})", results.join(", ")),
    }
}

fn binary_expr(x: Expr, op: &str, y: Expr, prec: u8) -> Expr {
    let mut e = Expr::new(prec);
    e.push_operand(x, prec).push_str(format!(" {} ", op)).push_operand(y, prec + 1);
    e
}

fn deref(p: Expr) -> Expr {
    if let [Segment::Text(s)] = p.segs.as_slice() {
        if let Some(name) = s.strip_prefix('&') {
            return Expr::primary(name);
        }
    }
    let mut e = Expr::new(UNARY);
    e.push_str("*").push_operand(p, UNARY);
    e
}

// =============================================================================
// BUILDER CONTRACT
// =============================================================================

impl spec::Builder for Builder {
    type Code = Code;

    fn push(&mut self, val: Value) -> &mut Self {
        self.push_expr(Expr::primary(go_literal(&val)))
    }

    fn pop(&mut self, n: usize) -> &mut Self {
        for e in self.pop_n(n) {
            self.discard(e);
        }
        self
    }

    fn builtin_op(&mut self, _kind: Kind, op: Operator) -> &mut Self {
        let prec = op.precedence();
        if op.is_unary() {
            let x = self.pop_expr();
            let mut e = Expr::new(UNARY);
            e.push_str(op.info().lit).push_operand(x, UNARY);
            return self.push_expr(e);
        }
        let y = self.pop_expr();
        let x = self.pop_expr();
        self.push_expr(binary_expr(x, op.info().lit, y, prec))
    }

    fn label(&mut self, l: &Label) -> &mut Self {
        let name = label_name(l);
        self.check_open("label");
        let frame = self.frame();
        let indent = frame.depth.saturating_sub(1);
        frame.lines.push(Line {
            indent,
            segs: vec![Segment::Text(format!("{}:", name))],
        });
        self
    }

    fn jmp(&mut self, l: &Label) -> &mut Self {
        self.text_line(format!("goto {}", label_name(l)))
    }

    fn jmp_if(&mut self, cond: bool, l: &Label) -> &mut Self {
        let c = self.pop_expr();
        let mut e = Expr::primary("if ");
        if cond {
            e.push_expr(c);
        } else {
            e.push_str("!").push_operand(c, UNARY);
        }
        e.push_str(format!(" {{ goto {} }}", label_name(l)));
        self.line(e)
    }

    fn case_ne(&mut self, l: &Label, arity: usize) -> &mut Self {
        let values = self.pop_n(arity);
        let tag = match self.stack.last() {
            Some(tag) => tag.clone(),
            None => internal_error("case without a switch tag"),
        };
        let tag = if tag.is_simple() {
            tag
        } else {
            // Hoisted so the tag is evaluated once.
            self.pop_expr();
            let name = self.temp("tag");
            let mut decl = Expr::primary(format!("{} := ", name));
            decl.push_expr(tag);
            self.line(decl);
            self.push_expr(Expr::primary(name.clone()));
            Expr::primary(name)
        };
        let mut e = Expr::primary("if ");
        for (i, v) in values.into_iter().enumerate() {
            if i > 0 {
                e.push_str(" && ");
            }
            e.push_expr(binary_expr(tag.clone(), "!=", v, Operator::NE.precedence()));
        }
        e.push_str(format!(" {{ goto {} }}", label_name(l)));
        self.line(e)
    }

    fn default_case(&mut self) -> &mut Self {
        self.pop_expr();
        self
    }

    fn for_phrase(
        &mut self,
        f: &ForPhrase,
        key: Option<&Var>,
        val: Option<&Var>,
        _has_exec_ctx: bool,
    ) -> &mut Self {
        let container = self.pop_expr();
        let mut header = Expr::primary("for ");
        match (key, val) {
            (None, None) => {}
            (Some(k), None) => {
                header.push_str(format!("{} = ", Self::var_name(k)));
            }
            (k, Some(v)) => {
                let k = k.map_or_else(|| "_".to_string(), Self::var_name);
                header.push_str(format!("{}, {} = ", k, Self::var_name(v)));
            }
        }
        header.push_str("range ").push_expr(container).push_str(" {");
        let state = ForState {
            stack_depth: self.stack.len(),
        };
        if self.fors.insert(f.id(), state).is_some() {
            internal_error(format!("for phrase {} started twice", f.id()));
        }
        self.open_block(header);
        self
    }

    fn filter_for_phrase(&mut self, f: &ForPhrase) -> &mut Self {
        if !self.fors.contains_key(&f.id()) {
            internal_error(format!("filter outside for phrase {}", f.id()));
        }
        let c = self.pop_expr();
        let mut header = Expr::primary("if !");
        header.push_operand(c, UNARY).push_str(" {");
        self.open_block(header);
        self.text_line("continue");
        self.close_block();
        self
    }

    fn end_for_phrase(&mut self, f: &ForPhrase) -> &mut Self {
        let state = match self.fors.remove(&f.id()) {
            Some(state) => state,
            None => internal_error(format!("end of for phrase {} that was not started", f.id())),
        };
        let produced = self.stack.len().saturating_sub(state.stack_depth);
        if produced > 0 {
            let (var, is_map) = match self.comps.last() {
                Some(c) => (c.var.clone(), c.is_map),
                None => internal_error("for phrase leaves values outside a comprehension"),
            };
            if is_map {
                let mut kv = self.pop_n(2);
                let v = kv.pop();
                let k = kv.pop();
                if let (Some(k), Some(v)) = (k, v) {
                    let mut e = Expr::primary(format!("{}[", var));
                    e.push_expr(k).push_str("] = ").push_expr(v);
                    self.line(e);
                }
            } else {
                let elem = self.pop_expr();
                let mut e = Expr::primary(format!("{0} = append({0}, ", var));
                e.push_expr(elem).push_str(")");
                self.line(e);
            }
        }
        self.close_block();
        self
    }

    fn list_comprehension(&mut self, c: &Comprehension) -> &mut Self {
        let var = self.temp("ret");
        let ty = self.type_expr(c.out());
        self.text_line(format!("var {} {}", var, ty));
        self.comps.push(CompState {
            id: c.id(),
            var,
            is_map: false,
        });
        self
    }

    fn map_comprehension(&mut self, c: &Comprehension) -> &mut Self {
        let var = self.temp("ret");
        let ty = self.type_expr(c.out());
        self.text_line(format!("{} := make({})", var, ty));
        self.comps.push(CompState {
            id: c.id(),
            var,
            is_map: true,
        });
        self
    }

    fn end_comprehension(&mut self, c: &Comprehension) -> &mut Self {
        match self.comps.pop() {
            Some(state) if state.id == c.id() => self.push_expr(Expr::primary(state.var)),
            _ => internal_error(format!("end of comprehension {} does not match its start", c.id())),
        }
    }

    fn closure(&mut self, fun: &FuncInfo) -> &mut Self {
        let e = match self.closures.get(&fun.id()) {
            Some(lit) => lit.clone(),
            None => Expr::primary(fun.name()),
        };
        self.push_expr(e)
    }

    fn go_closure(&mut self, fun: &FuncInfo) -> &mut Self {
        self.closure(fun)
    }

    fn call_closure(&mut self, nexpr: usize, _arity: i32, ellipsis: bool) -> &mut Self {
        let args = self.pop_n(nexpr);
        let f = self.pop_expr();
        self.push_expr(Expr::call(f, args, ellipsis))
    }

    fn call_go_closure(&mut self, nexpr: usize, arity: i32, ellipsis: bool) -> &mut Self {
        self.call_closure(nexpr, arity, ellipsis)
    }

    fn call_func(&mut self, fun: &FuncInfo, nexpr: usize) -> &mut Self {
        let args = self.pop_n(nexpr);
        self.push_expr(Expr::call(Expr::primary(fun.name()), args, false))
    }

    fn call_funcv(&mut self, fun: &FuncInfo, nexpr: usize, arity: i32) -> &mut Self {
        let args = self.pop_n(nexpr);
        self.push_expr(Expr::call(Expr::primary(fun.name()), args, arity == ARITY_ELLIPSIS))
    }

    fn call_go_func(&mut self, fun: GoFuncAddr, nexpr: usize) -> &mut Self {
        let info = self.iface.get_go_func_info(fun).clone();
        self.call_go(info, nexpr, 0)
    }

    fn call_go_funcv(&mut self, fun: GoFuncvAddr, nexpr: usize, arity: i32) -> &mut Self {
        let info = self.iface.get_go_funcv_info(fun).clone();
        self.call_go(info, nexpr, arity)
    }

    fn define_func(&mut self, fun: &FuncInfo) -> &mut Self {
        self.check_open("define_func");
        if self.frames.iter().any(|f| f.fun.as_ref().is_some_and(|g| g.id() == fun.id())) {
            internal_error(format!("function `{}` defined twice", fun.name()));
        }
        let mut frame = FuncFrame::new(Some(fun.clone()));
        if !fun.is_unnamed_out() {
            frame.vars.extend(fun.results().iter().map(Var::id));
        }
        self.frames.push(frame);
        self
    }

    fn return_(&mut self, n: i32) -> &mut Self {
        if n == RETURN_NAMED_RESULTS || n == 0 {
            return self.text_line("return");
        }
        let values = self.pop_n(n as usize);
        let mut e = Expr::primary("return ");
        e.push_list(values);
        self.line(e)
    }

    fn load(&mut self, idx: i32) -> &mut Self {
        let name = self.arg_name(idx);
        self.push_expr(Expr::primary(name))
    }

    fn store(&mut self, idx: i32) -> &mut Self {
        let name = self.arg_name(idx);
        let v = self.pop_expr();
        let mut e = Expr::primary(format!("{} = ", name));
        e.push_expr(v);
        self.line(e)
    }

    fn end_func(&mut self, fun: &FuncInfo) -> &mut Self {
        self.check_open("end_func");
        let open = self.frames.last().and_then(|f| f.fun.as_ref()).map(FuncInfo::id);
        if self.frames.len() < 2 || open != Some(fun.id()) {
            internal_error(format!("end_func(`{}`) does not match the open function", fun.name()));
        }
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => internal_error("builder has no frame"),
        };
        let sig = self.signature(fun);

        if fun.nest_depth() == 0 {
            let mut lines = vec![Line {
                indent: 0,
                segs: vec![Segment::Text(format!("{} {{", sig.replacen("func", &format!("func {}", fun.name()), 1)))],
            }];
            lines.extend(frame.lines);
            lines.push(Line {
                indent: 0,
                segs: vec![Segment::Text("}".to_string())],
            });
            self.funcs.push(lines);
        } else {
            let outer = self.frame().depth;
            let mut lit = Expr::primary(format!("{} {{\n", sig));
            for line in frame.lines {
                lit.push_str("\t".repeat(outer + line.indent));
                for seg in line.segs {
                    match seg {
                        Segment::Text(s) => {
                            lit.push_str(s);
                        }
                        slot => lit.segs.push(slot),
                    }
                }
                lit.push_str("\n");
            }
            lit.push_str(format!("{}}}", "\t".repeat(outer)));
            self.closures.insert(fun.id(), lit);
        }
        tracing::debug!(func = fun.name(), nested = fun.nest_depth() > 0, "function rendered");
        self
    }

    fn define_var(&mut self, vars: &[Var]) -> &mut Self {
        for v in vars {
            if !self.frame().vars.insert(v.id()) {
                internal_error(format!("variable `{}` defined twice", v.name()));
            }
            let ty = self.type_expr(v.ty());
            self.text_line(format!("var {} {}", Self::var_name(v), ty));
        }
        self
    }

    fn in_current_ctx(&self, v: &Var) -> bool {
        self.frames.last().is_some_and(|f| f.vars.contains(&v.id()))
    }

    fn load_var(&mut self, v: &Var) -> &mut Self {
        self.push_expr(Expr::primary(Self::var_name(v)))
    }

    fn store_var(&mut self, v: &Var) -> &mut Self {
        let x = self.pop_expr();
        let mut e = Expr::primary(format!("{} = ", Self::var_name(v)));
        e.push_expr(x);
        self.line(e)
    }

    fn addr_var(&mut self, v: &Var) -> &mut Self {
        self.push_expr(Expr::text(format!("&{}", Self::var_name(v)), UNARY))
    }

    fn addr_op(&mut self, _kind: Kind, op: AddrOperator) -> &mut Self {
        let p = deref(self.pop_expr());
        match op {
            AddrOperator::AddrVal => self.push_expr(p),
            AddrOperator::Inc | AddrOperator::Dec => {
                let mut e = Expr::new(PRIMARY);
                e.push_expr(p).push_str(op.lit());
                self.line(e)
            }
            _ => {
                let v = self.pop_expr();
                let mut e = Expr::new(PRIMARY);
                e.push_expr(p).push_str(format!(" {} ", op.lit())).push_expr(v);
                self.line(e)
            }
        }
    }

    fn append(&mut self, _ty: &Type, arity: i32) -> &mut Self {
        let (n, ellipsis) = if arity == ARITY_ELLIPSIS {
            (2, true)
        } else {
            (arity as usize, false)
        };
        let args = self.pop_n(n);
        self.push_expr(Expr::call(Expr::primary("append"), args, ellipsis))
    }

    fn make_array(&mut self, ty: &Type, arity: usize) -> &mut Self {
        let elems = self.pop_n(arity);
        let mut e = Expr::primary(self.type_expr(ty));
        e.push_str("{").push_list(elems).push_str("}");
        self.push_expr(e)
    }

    fn make_map(&mut self, ty: &Type, arity: usize) -> &mut Self {
        let items = self.pop_n(arity * 2);
        let mut e = Expr::primary(self.type_expr(ty));
        e.push_str("{");
        for (i, pair) in items.chunks(2).enumerate() {
            if i > 0 {
                e.push_str(", ");
            }
            e.push_expr(pair[0].clone()).push_str(": ").push_expr(pair[1].clone());
        }
        e.push_str("}");
        self.push_expr(e)
    }

    fn make(&mut self, ty: &Type, arity: usize) -> &mut Self {
        let mut args = vec![Expr::primary(self.type_expr(ty))];
        args.extend(self.pop_n(arity));
        self.push_expr(Expr::call(Expr::primary("make"), args, false))
    }

    fn map_index(&mut self) -> &mut Self {
        self.index(spec::INDEX_FROM_STACK)
    }

    fn set_map_index(&mut self) -> &mut Self {
        self.set_index(spec::INDEX_FROM_STACK)
    }

    fn index(&mut self, idx: i32) -> &mut Self {
        let (x, index) = self.index_expr(idx);
        let mut e = Expr::new(PRIMARY);
        e.push_operand(x, PRIMARY).push_str("[").push_expr(index).push_str("]");
        self.push_expr(e)
    }

    fn set_index(&mut self, idx: i32) -> &mut Self {
        let (x, index) = self.index_expr(idx);
        let v = self.pop_expr();
        let mut e = Expr::new(PRIMARY);
        e.push_operand(x, PRIMARY)
            .push_str("[")
            .push_expr(index)
            .push_str("] = ")
            .push_expr(v);
        self.line(e)
    }

    fn slice(&mut self, i: i32, j: i32) -> &mut Self {
        self.slice_expr(vec![i, j])
    }

    fn slice3(&mut self, i: i32, j: i32, k: i32) -> &mut Self {
        self.slice_expr(vec![i, j, k])
    }

    fn type_cast(&mut self, _from: &Type, to: &Type) -> &mut Self {
        let x = self.pop_expr();
        let mut head = self.type_expr(to);
        if head.starts_with('*') || head.starts_with("func") || head.starts_with("chan") {
            head = format!("({})", head);
        }
        let mut e = Expr::primary(head);
        e.push_str("(").push_expr(x).push_str(")");
        self.push_expr(e)
    }

    fn go_builtin(&mut self, _ty: &Type, op: GoBuiltin) -> &mut Self {
        let args = self.pop_n(op.arity());
        let call = Expr::call(Expr::primary(op.name()), args, false);
        if op.produces_value() {
            self.push_expr(call)
        } else {
            self.line(call)
        }
    }

    fn zero(&mut self, ty: &Type) -> &mut Self {
        let e = match zero_literal(ty.kind()).filter(|_| !ty.is_named()) {
            Some(lit) => Expr::primary(lit),
            None => Expr::primary(format!("*new({})", self.type_expr(ty))),
        };
        self.push_expr(e)
    }

    fn start_stmt(&mut self, _stmt: Option<&SourcePos>) -> StmtStart {
        self.check_open("start_stmt");
        let line = self.frames.last().map_or(0, |f| f.lines.len());
        self.stmts.push(StmtState {
            stack_depth: self.stack.len(),
            line,
        });
        StmtStart(self.stmts.len() - 1)
    }

    fn end_stmt(&mut self, stmt: Option<&SourcePos>, start: StmtStart) -> &mut Self {
        self.check_open("end_stmt");
        if start.0 >= self.stmts.len() {
            internal_error(format!("end_stmt for unknown statement {}", start.0));
        }
        let state = self.stmts.split_off(start.0).swap_remove(0);

        let rest = self.stack.len().saturating_sub(state.stack_depth);
        for e in self.pop_n(rest) {
            self.discard(e);
        }
        if let (Some(pos), true) = (stmt, self.options.line_directives) {
            let frame = self.frame();
            let at = state.line.min(frame.lines.len());
            frame.lines.insert(
                at,
                Line {
                    indent: 0,
                    segs: vec![Segment::Text(format!("//line {}:{}", pos.file, pos.line))],
                },
            );
        }
        self
    }

    fn reserve(&mut self) -> Reserved {
        self.check_open("reserve");
        let slot = self.slots.len();
        self.slots.push(None);
        self.stack.push(Expr::slot(slot));
        tracing::trace!(builder = self.id, slot, "source slot reserved");
        Reserved::new(self.id, slot)
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
        match self.slots.get_mut(r.pos()) {
            Some(slot) if slot.is_none() => *slot = Some(go_literal(&v)),
            Some(_) => internal_error(format!("reserved position {} resolved twice", r.pos())),
            None => internal_error(format!("unknown reserved position {}", r.pos())),
        }
    }

    fn global_interface(&self) -> &dyn Interface {
        self.iface.as_ref()
    }

    fn resolve(&mut self) -> Code {
        self.check_open("resolve");
        let unresolved = self.slots.iter().filter(|s| s.is_none()).count();
        if unresolved > 0 {
            internal_error(format!("{} reserved position(s) unresolved", unresolved));
        }
        if self.frames.len() != 1 {
            internal_error("function has no end_func");
        }
        if let Some(id) = self.fors.keys().next() {
            internal_error(format!("for phrase {} has no end_for_phrase", id));
        }
        if let Some(c) = self.comps.last() {
            internal_error(format!("comprehension {} has no end_comprehension", c.id));
        }
        let rest = self.pop_n(self.stack.len());
        for e in rest {
            self.discard(e);
        }

        let source = self.render_source();
        self.resolved = true;
        let code = Code::new(source);
        tracing::debug!(builder = self.id, lines = spec::Code::len(&code), "go source resolved");
        code
    }
}

fn label_name(l: &Label) -> String {
    let valid = l
        .name()
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c.is_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if valid && !l.name().is_empty() {
        l.name().to_string()
    } else {
        format!("_gop_L{}", l.id())
    }
}
