use serde::{Deserialize, Serialize};

use crate::bytecode::Op;
use crate::exec::spec::{self, SourcePos};

/// Entry of a function defined in the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncEntry {
    pub id: u32,
    pub name: String,
    /// First instruction of the body.
    pub entry: usize,
    /// One past the last instruction of the body.
    pub end: usize,
    pub num_in: usize,
    pub num_out: usize,
    pub variadic: bool,
    /// Variable slots of the function's frame.
    pub num_vars: u32,
}

/// Instructions `start..end` belong to the statement at `pos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StmtSpan {
    pub start: usize,
    pub end: usize,
    pub pos: SourcePos,
}

/// Resolved bytecode of one compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub(crate) ops: Vec<Op>,
    pub(crate) funcs: Vec<FuncEntry>,
    pub(crate) spans: Vec<StmtSpan>,
    /// Variable slots of the top-level frame.
    pub(crate) num_vars: u32,
}

impl Code {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn funcs(&self) -> &[FuncEntry] {
        &self.funcs
    }

    /// Function with handle id `id`.
    pub fn func(&self, id: u32) -> Option<&FuncEntry> {
        self.funcs.iter().find(|f| f.id == id)
    }

    pub fn spans(&self) -> &[StmtSpan] {
        &self.spans
    }

    /// Source position of the innermost statement containing `ip`.
    pub fn pos_at(&self, ip: usize) -> Option<&SourcePos> {
        self.spans
            .iter()
            .filter(|s| (s.start..s.end).contains(&ip))
            .min_by_key(|s| s.end - s.start)
            .map(|s| &s.pos)
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl spec::Code for Code {
    fn len(&self) -> usize {
        self.ops.len()
    }
}
