use serde::{Deserialize, Serialize};

use crate::exec::kind::Kind;
use crate::exec::operator::{AddrOperator, GoBuiltin, Operator};
use crate::exec::spec::{GoFuncAddr, GoFuncvAddr};
use crate::exec::types::Type;
use crate::lang::value::Value;

/// Frame-relative address of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarRef {
    /// How many function frames up the variable lives; 0 is the current frame.
    pub scope: u32,
    pub slot: u32,
}

// =============================================================================
// OP - Bytecode instructions
// =============================================================================

/// One instruction.
///
/// Jump offsets are relative to the instruction's own position: `Jump(1)`
/// falls through, `Jump(0)` loops forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // constants & stack
    Push(Value),
    Pop(usize),
    /// Position reserved for a constant not yet bound. Never present in resolved code.
    Reserved,
    Zero(Type),

    // operators
    BuiltinOp(Kind, Operator),
    AddrOp(Kind, AddrOperator),
    TypeCast { from: Type, to: Type },
    GoBuiltin(Type, GoBuiltin),

    // ==========================================================================
    // Control flow
    // ==========================================================================
    Jump(i32),
    /// Pop a bool, jump when it equals `cond`.
    JumpIf { cond: bool, offset: i32 },
    /// Compare the tag under `arity` case values; jump when none matches.
    CaseNE { offset: i32, arity: usize },
    /// Pop the switch tag.
    Default,

    // ==========================================================================
    // Iteration
    // ==========================================================================
    /// Start iterating; `exit` jumps past the matching `EndForPhrase` when done.
    ForPhrase {
        key: Option<VarRef>,
        val: Option<VarRef>,
        has_exec_ctx: bool,
        exit: i32,
    },
    /// Pop a bool; when false, jump to the phrase's `EndForPhrase`.
    FilterForPhrase(i32),
    /// Jump back to the phrase's `ForPhrase`.
    EndForPhrase(i32),
    ListComprehension(Type),
    MapComprehension(Type),
    EndComprehension,

    // ==========================================================================
    // Functions
    // ==========================================================================
    Closure(u32),
    GoClosure(u32),
    CallClosure { nexpr: usize, arity: i32, ellipsis: bool },
    CallGoClosure { nexpr: usize, arity: i32, ellipsis: bool },
    CallFunc { func: u32, nexpr: usize },
    CallFuncv { func: u32, nexpr: usize, arity: i32 },
    CallGoFunc { addr: GoFuncAddr, nexpr: usize },
    CallGoFuncv { addr: GoFuncvAddr, nexpr: usize, arity: i32 },
    Return(i32),
    /// Argument access; parameter i of n is at index `i - n`.
    Load(i32),
    Store(i32),

    // ==========================================================================
    // Variables
    // ==========================================================================
    LoadVar(VarRef),
    StoreVar(VarRef),
    AddrVar(VarRef),

    // ==========================================================================
    // Composites
    // ==========================================================================
    Append { ty: Type, arity: i32 },
    MakeArray { ty: Type, arity: usize },
    MakeMap { ty: Type, arity: usize },
    Make { ty: Type, arity: usize },
    MapIndex,
    SetMapIndex,
    Index(i32),
    SetIndex(i32),
    Slice(i32, i32),
    Slice3(i32, i32, i32),
}

impl Op {
    /// Relative jump offset carried by this instruction.
    pub fn jump_offset(&self) -> Option<i32> {
        match *self {
            Op::Jump(offset)
            | Op::JumpIf { offset, .. }
            | Op::CaseNE { offset, .. }
            | Op::FilterForPhrase(offset)
            | Op::EndForPhrase(offset)
            | Op::ForPhrase { exit: offset, .. } => Some(offset),
            _ => None,
        }
    }

    fn set_jump_offset(&mut self, new: i32) -> bool {
        match self {
            Op::Jump(offset)
            | Op::JumpIf { offset, .. }
            | Op::CaseNE { offset, .. }
            | Op::FilterForPhrase(offset)
            | Op::EndForPhrase(offset)
            | Op::ForPhrase { exit: offset, .. } => {
                *offset = new;
                true
            }
            _ => false,
        }
    }

    /// Point the jump at `ip` to absolute position `target`.
    pub(crate) fn patch_jump(ops: &mut [Op], ip: usize, target: usize) -> bool {
        let offset = target as i64 - ip as i64;
        match (i32::try_from(offset), ops.get_mut(ip)) {
            (Ok(offset), Some(op)) => op.set_jump_offset(offset),
            _ => false,
        }
    }
}
