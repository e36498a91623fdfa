use serde::{Deserialize, Serialize};

use crate::exec::kind::{
    BIT_NONE, BITS_ALL_INT_UINT, BITS_ALL_NUMBER, BITS_ALL_REAL, Kind,
};

// =============================================================================
// OPERATOR - built-in operators and their operand tables
// =============================================================================

/// Built-in operator applied by `Builder::builtin_op` and constant folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    // binary
    Add,
    Sub,
    Mul,
    Quo,
    Mod,
    And,
    Or,
    Xor,
    AndNot,
    Lsh,
    Rsh,
    LT,
    LE,
    GT,
    GE,
    EQ,
    NE,
    LAnd,
    LOr,

    // unary
    Neg,
    Not,
    BitNot,
}

/// Result kind of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpResult {
    /// The result has the kind of the first operand.
    SameAsFirst,
    /// The result is always a `bool`.
    Bool,
}

/// Marker used in `in_second` when the second operand must match the first.
pub const BIT_SAME_AS_FIRST: u64 = 1 << 63;

/// Operand table of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    /// Source literal, e.g. `"+"`.
    pub lit: &'static str,
    /// Kinds accepted as first operand.
    pub in_first: u64,
    /// Kinds accepted as second operand; `BIT_NONE` for unary operators.
    pub in_second: u64,
    pub out: OpResult,
}

impl OperatorInfo {
    const fn binary(lit: &'static str, in_first: u64, out: OpResult) -> Self {
        Self { lit, in_first, in_second: BIT_SAME_AS_FIRST, out }
    }

    const fn unary(lit: &'static str, in_first: u64, out: OpResult) -> Self {
        Self { lit, in_first, in_second: BIT_NONE, out }
    }

    pub fn accepts_first(&self, kind: Kind) -> bool {
        self.in_first & kind.bit() != 0
    }
}

const BITS_EQUALITY: u64 = BITS_ALL_NUMBER | Kind::String.bit() | Kind::Bool.bit();
const BITS_ORDERED: u64 = BITS_ALL_REAL | Kind::String.bit();

impl Operator {
    /// Operand table for this operator.
    pub fn info(self) -> OperatorInfo {
        use OpResult::{Bool, SameAsFirst};
        match self {
            Operator::Add => OperatorInfo::binary("+", BITS_ALL_NUMBER | Kind::String.bit(), SameAsFirst),
            Operator::Sub => OperatorInfo::binary("-", BITS_ALL_NUMBER, SameAsFirst),
            Operator::Mul => OperatorInfo::binary("*", BITS_ALL_NUMBER, SameAsFirst),
            Operator::Quo => OperatorInfo::binary("/", BITS_ALL_NUMBER, SameAsFirst),
            Operator::Mod => OperatorInfo::binary("%", BITS_ALL_INT_UINT, SameAsFirst),
            Operator::And => OperatorInfo::binary("&", BITS_ALL_INT_UINT, SameAsFirst),
            Operator::Or => OperatorInfo::binary("|", BITS_ALL_INT_UINT, SameAsFirst),
            Operator::Xor => OperatorInfo::binary("^", BITS_ALL_INT_UINT, SameAsFirst),
            Operator::AndNot => OperatorInfo::binary("&^", BITS_ALL_INT_UINT, SameAsFirst),
            Operator::Lsh => OperatorInfo {
                lit: "<<",
                in_first: BITS_ALL_INT_UINT,
                in_second: BITS_ALL_INT_UINT,
                out: SameAsFirst,
            },
            Operator::Rsh => OperatorInfo {
                lit: ">>",
                in_first: BITS_ALL_INT_UINT,
                in_second: BITS_ALL_INT_UINT,
                out: SameAsFirst,
            },
            Operator::LT => OperatorInfo::binary("<", BITS_ORDERED, Bool),
            Operator::LE => OperatorInfo::binary("<=", BITS_ORDERED, Bool),
            Operator::GT => OperatorInfo::binary(">", BITS_ORDERED, Bool),
            Operator::GE => OperatorInfo::binary(">=", BITS_ORDERED, Bool),
            Operator::EQ => OperatorInfo::binary("==", BITS_EQUALITY, Bool),
            Operator::NE => OperatorInfo::binary("!=", BITS_EQUALITY, Bool),
            Operator::LAnd => OperatorInfo::binary("&&", Kind::Bool.bit(), Bool),
            Operator::LOr => OperatorInfo::binary("||", Kind::Bool.bit(), Bool),
            Operator::Neg => OperatorInfo::unary("-", BITS_ALL_NUMBER, SameAsFirst),
            Operator::Not => OperatorInfo::unary("!", Kind::Bool.bit(), Bool),
            Operator::BitNot => OperatorInfo::unary("^", BITS_ALL_INT_UINT, SameAsFirst),
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Operator::Neg | Operator::Not | Operator::BitNot)
    }

    pub fn is_shift(self) -> bool {
        matches!(self, Operator::Lsh | Operator::Rsh)
    }

    /// Binding strength in source form; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::LOr => 1,
            Operator::LAnd => 2,
            Operator::EQ | Operator::NE | Operator::LT | Operator::LE | Operator::GT | Operator::GE => 3,
            Operator::Add | Operator::Sub | Operator::Or | Operator::Xor => 4,
            Operator::Mul
            | Operator::Quo
            | Operator::Mod
            | Operator::Lsh
            | Operator::Rsh
            | Operator::And
            | Operator::AndNot => 5,
            Operator::Neg | Operator::Not | Operator::BitNot => 6,
        }
    }

    /// Result kind of applying this operator to operands of `kind`.
    pub fn result_kind(self, kind: Kind) -> Kind {
        match self.info().out {
            OpResult::SameAsFirst => kind,
            OpResult::Bool => Kind::Bool,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.info().lit)
    }
}

// =============================================================================
// ADDRESS OPERATORS
// =============================================================================

/// Operation through an address: `*p`, `*p = v`, `*p += v`, `*p++`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrOperator {
    AddrVal,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    AndNotAssign,
    LshAssign,
    RshAssign,
    Inc,
    Dec,
}

impl AddrOperator {
    pub fn lit(self) -> &'static str {
        match self {
            AddrOperator::AddrVal => "*",
            AddrOperator::Assign => "=",
            AddrOperator::AddAssign => "+=",
            AddrOperator::SubAssign => "-=",
            AddrOperator::MulAssign => "*=",
            AddrOperator::QuoAssign => "/=",
            AddrOperator::ModAssign => "%=",
            AddrOperator::AndAssign => "&=",
            AddrOperator::OrAssign => "|=",
            AddrOperator::XorAssign => "^=",
            AddrOperator::AndNotAssign => "&^=",
            AddrOperator::LshAssign => "<<=",
            AddrOperator::RshAssign => ">>=",
            AddrOperator::Inc => "++",
            AddrOperator::Dec => "--",
        }
    }

    /// Number of operands popped besides the address itself.
    pub fn arity(self) -> usize {
        match self {
            AddrOperator::AddrVal | AddrOperator::Inc | AddrOperator::Dec => 0,
            _ => 1,
        }
    }

    /// `AddrVal` is the only operator that leaves a value on the stack.
    pub fn produces_value(self) -> bool {
        self == AddrOperator::AddrVal
    }
}

// =============================================================================
// GO BUILTINS
// =============================================================================

/// Built-in functions that are not expressible as ordinary calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoBuiltin {
    Len,
    Cap,
    Copy,
    Delete,
}

impl GoBuiltin {
    pub fn name(self) -> &'static str {
        match self {
            GoBuiltin::Len => "len",
            GoBuiltin::Cap => "cap",
            GoBuiltin::Copy => "copy",
            GoBuiltin::Delete => "delete",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            GoBuiltin::Len | GoBuiltin::Cap => 1,
            GoBuiltin::Copy | GoBuiltin::Delete => 2,
        }
    }

    pub fn produces_value(self) -> bool {
        self != GoBuiltin::Delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accepts_strings_and_numbers() {
        let info = Operator::Add.info();
        assert!(info.accepts_first(Kind::String));
        assert!(info.accepts_first(Kind::Complex64));
        assert!(!info.accepts_first(Kind::Bool));
    }

    #[test]
    fn test_mod_rejects_floats() {
        let info = Operator::Mod.info();
        assert!(info.accepts_first(Kind::Uint8));
        assert!(!info.accepts_first(Kind::Float64));
    }

    #[test]
    fn test_comparisons_yield_bool() {
        assert_eq!(Operator::LT.result_kind(Kind::Int), Kind::Bool);
        assert_eq!(Operator::Add.result_kind(Kind::Int8), Kind::Int8);
        assert!(!Operator::LT.info().accepts_first(Kind::Complex128));
        assert!(Operator::EQ.info().accepts_first(Kind::Complex128));
    }

    #[test]
    fn test_unary_table() {
        assert!(Operator::Neg.is_unary());
        assert_eq!(Operator::Neg.info().in_second, BIT_NONE);
        assert!(Operator::Not.info().accepts_first(Kind::Bool));
        assert!(!Operator::BitNot.info().accepts_first(Kind::Float32));
    }

    #[test]
    fn test_precedence_order() {
        assert!(Operator::Mul.precedence() > Operator::Add.precedence());
        assert!(Operator::Add.precedence() > Operator::EQ.precedence());
        assert!(Operator::LAnd.precedence() > Operator::LOr.precedence());
    }

    #[test]
    fn test_addr_operator_arity() {
        assert_eq!(AddrOperator::Inc.arity(), 0);
        assert_eq!(AddrOperator::AddAssign.arity(), 1);
        assert!(AddrOperator::AddrVal.produces_value());
        assert_eq!(AddrOperator::AndNotAssign.lit(), "&^=");
    }

    #[test]
    fn test_go_builtin_table() {
        assert_eq!(GoBuiltin::Copy.arity(), 2);
        assert!(!GoBuiltin::Delete.produces_value());
        assert_eq!(GoBuiltin::Len.name(), "len");
    }
}
