use std::collections::HashSet;

use crate::bytecode::op::VarRef;
use crate::bytecode::{Code, Op};

/// Print disassembly of resolved code.
pub fn print_code(code: &Code) {
    println!("=== BYTECODE ===\n");
    print!("{}", disassemble(code));
}

/// Disassembly of resolved code, one instruction per line.
pub fn disassemble(code: &Code) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "main: {} instructions, {} vars\n",
        code.ops().len(),
        code.num_vars()
    ));
    for f in code.funcs() {
        out.push_str(&format!(
            "func {} #{}: {:04}..{:04}, in {}{}, out {}, {} vars\n",
            f.name,
            f.id,
            f.entry,
            f.end,
            f.num_in,
            if f.variadic { "..." } else { "" },
            f.num_out,
            f.num_vars
        ));
    }
    out.push_str("════════════════════════════════════════\n");
    out.push_str(&disassemble_ops(code));
    out
}

fn disassemble_ops(code: &Code) -> String {
    let ops = code.ops();
    let jump_targets = collect_jump_targets(ops);
    let entries: Vec<(usize, &str)> = code.funcs().iter().map(|f| (f.entry, f.name.as_str())).collect();
    let mut output = String::new();
    let mut last_pos = None;

    for (ip, op) in ops.iter().enumerate() {
        for (_, name) in entries.iter().filter(|(entry, _)| *entry == ip) {
            output.push_str(&format!("      ; func {}\n", name));
        }
        let pos = code.pos_at(ip);
        if pos.is_some() && pos != last_pos {
            if let Some(pos) = pos {
                output.push_str(&format!("      ; {}:{}\n", pos.file, pos.line));
            }
        }
        last_pos = pos;

        if jump_targets.contains(&ip) {
            output.push_str("      ┌──────────────────────────────────\n");
        }
        output.push_str(&format!("{:04} ", ip));
        output.push_str(if jump_targets.contains(&ip) { "► " } else { "  " });
        output.push_str(&format_op(op, ip));
        output.push('\n');
    }

    output
}

fn collect_jump_targets(ops: &[Op]) -> HashSet<usize> {
    ops.iter()
        .enumerate()
        .filter_map(|(ip, op)| op.jump_offset().map(|offset| target(ip, offset)))
        .collect()
}

fn target(ip: usize, offset: i32) -> usize {
    (ip as i64 + offset as i64).max(0) as usize
}

fn jump(name: &str, ip: usize, offset: i32) -> String {
    let direction = if offset < 0 { "↑" } else { "↓" };
    format!("{:<12}{:+} {} (→ {:04})", name, offset, direction, target(ip, offset))
}

fn var(r: &VarRef) -> String {
    if r.scope == 0 {
        format!("${}", r.slot)
    } else {
        format!("${}^{}", r.slot, r.scope)
    }
}

fn opt_var(r: &Option<VarRef>) -> String {
    r.as_ref().map_or_else(|| "_".to_string(), var)
}

fn arity(arity: i32) -> String {
    if arity < 0 {
        "...".to_string()
    } else {
        arity.to_string()
    }
}

fn format_op(op: &Op, ip: usize) -> String {
    match op {
        Op::Push(v) => format!("PUSH        {} ; {}", v.literal(), v.kind()),
        Op::Pop(n) => format!("POP         {}", n),
        Op::Reserved => "RESERVED".to_string(),
        Op::Zero(ty) => format!("ZERO        {}", ty),

        Op::BuiltinOp(kind, op) => format!("OP          {} ; {}", op, kind),
        Op::AddrOp(kind, op) => format!("ADDR_OP     {} ; {}", op.lit(), kind),
        Op::TypeCast { from, to } => format!("CAST        {} -> {}", from, to),
        Op::GoBuiltin(ty, b) => format!("GO_BUILTIN  {} ; {}", b.name(), ty),

        Op::Jump(offset) => jump("JUMP", ip, *offset),
        Op::JumpIf { cond, offset } => {
            jump(if *cond { "JUMP_TRUE" } else { "JUMP_FALSE" }, ip, *offset)
        }
        Op::CaseNE { offset, arity } => format!("{} ; {} values", jump("CASE_NE", ip, *offset), arity),
        Op::Default => "DEFAULT".to_string(),

        Op::ForPhrase {
            key,
            val,
            has_exec_ctx,
            exit,
        } => format!(
            "{} ; k={} v={}{}",
            jump("FOR", ip, *exit),
            opt_var(key),
            opt_var(val),
            if *has_exec_ctx { " ctx" } else { "" }
        ),
        Op::FilterForPhrase(offset) => jump("FOR_FILTER", ip, *offset),
        Op::EndForPhrase(offset) => jump("FOR_END", ip, *offset),
        Op::ListComprehension(ty) => format!("LIST_COMP   {}", ty),
        Op::MapComprehension(ty) => format!("MAP_COMP    {}", ty),
        Op::EndComprehension => "COMP_END".to_string(),

        Op::Closure(id) => format!("CLOSURE     #{}", id),
        Op::GoClosure(id) => format!("GO_CLOSURE  #{}", id),
        Op::CallClosure {
            nexpr,
            arity: n,
            ellipsis,
        } => format!(
            "CALL_CLOS   {}/{}{}",
            nexpr,
            arity(*n),
            if *ellipsis { " ..." } else { "" }
        ),
        Op::CallGoClosure {
            nexpr,
            arity: n,
            ellipsis,
        } => format!(
            "CALL_GOCLOS {}/{}{}",
            nexpr,
            arity(*n),
            if *ellipsis { " ..." } else { "" }
        ),
        Op::CallFunc { func, nexpr } => format!("CALL        #{} ; {} args", func, nexpr),
        Op::CallFuncv {
            func,
            nexpr,
            arity: n,
        } => format!("CALLV       #{} ; {}/{}", func, nexpr, arity(*n)),
        Op::CallGoFunc { addr, nexpr } => format!("CALL_GO     @{} ; {} args", addr.0, nexpr),
        Op::CallGoFuncv {
            addr,
            nexpr,
            arity: n,
        } => format!("CALL_GOV    @{} ; {}/{}", addr.0, nexpr, arity(*n)),
        Op::Return(n) if *n < 0 => "RETURN      named".to_string(),
        Op::Return(n) => format!("RETURN      {}", n),
        Op::Load(idx) => format!("LOAD        {}", idx),
        Op::Store(idx) => format!("STORE       {}", idx),

        Op::LoadVar(r) => format!("LOAD_VAR    {}", var(r)),
        Op::StoreVar(r) => format!("STORE_VAR   {}", var(r)),
        Op::AddrVar(r) => format!("ADDR_VAR    {}", var(r)),

        Op::Append { ty, arity: n } => format!("APPEND      {} ; {}", arity(*n), ty),
        Op::MakeArray { ty, arity } => format!("MAKE_ARRAY  {} ; {}", arity, ty),
        Op::MakeMap { ty, arity } => format!("MAKE_MAP    {} ; {}", arity, ty),
        Op::Make { ty, arity } => format!("MAKE        {} ; {}", arity, ty),
        Op::MapIndex => "MAP_INDEX".to_string(),
        Op::SetMapIndex => "SET_MAP_INDEX".to_string(),
        Op::Index(idx) => format!("INDEX       {}", index(*idx)),
        Op::SetIndex(idx) => format!("SET_INDEX   {}", index(*idx)),
        Op::Slice(i, j) => format!("SLICE       [{}:{}]", bound(*i), bound(*j)),
        Op::Slice3(i, j, k) => format!("SLICE3      [{}:{}:{}]", bound(*i), bound(*j), bound(*k)),
    }
}

fn index(idx: i32) -> String {
    if idx < 0 { "<stack>".to_string() } else { idx.to_string() }
}

fn bound(b: i32) -> String {
    match b {
        crate::exec::SLICE_DEFAULT => String::new(),
        crate::exec::SLICE_FROM_STACK => "<stack>".to_string(),
        b => b.to_string(),
    }
}
