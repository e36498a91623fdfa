use serde::{Deserialize, Serialize};

// =============================================================================
// KIND - runtime representation kinds plus the unbound constant markers
// =============================================================================

/// Kind of a compile-time value.
///
/// The first block mirrors the host's runtime type kinds. The three trailing
/// markers only ever appear on constants whose concrete type is not fixed yet.
/// Their relative order is the promotion order: int < float < complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Kind {
    Invalid = 0,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Array,
    Chan,
    Func,
    Interface,
    Map,
    Ptr,
    Slice,
    String,
    Struct,
    UnsafePointer,

    // ─────────────────────────── unbound markers ───────────────────────────
    UnboundInt,
    UnboundFloat,
    UnboundComplex,
}

pub const BIT_NONE: u64 = 0;

pub const BITS_ALL_INT: u64 =
    Kind::Int.bit() | Kind::Int8.bit() | Kind::Int16.bit() | Kind::Int32.bit() | Kind::Int64.bit();

pub const BITS_ALL_UINT: u64 = Kind::Uint.bit()
    | Kind::Uint8.bit()
    | Kind::Uint16.bit()
    | Kind::Uint32.bit()
    | Kind::Uint64.bit()
    | Kind::Uintptr.bit();

pub const BITS_ALL_INT_UINT: u64 = BITS_ALL_INT | BITS_ALL_UINT;

pub const BITS_ALL_FLOAT: u64 = Kind::Float32.bit() | Kind::Float64.bit();

pub const BITS_ALL_REAL: u64 = BITS_ALL_INT_UINT | BITS_ALL_FLOAT;

pub const BITS_ALL_COMPLEX: u64 = Kind::Complex64.bit() | Kind::Complex128.bit();

pub const BITS_ALL_NUMBER: u64 = BITS_ALL_REAL | BITS_ALL_COMPLEX;

impl Kind {
    /// Bit of this kind inside an operator's accepted-kind mask.
    pub const fn bit(self) -> u64 {
        1 << (self as u8)
    }

    /// A kind is bound when it names a concrete runtime representation.
    pub fn is_bound(self) -> bool {
        self <= Kind::UnsafePointer
    }

    pub fn is_unbound(self) -> bool {
        matches!(self, Kind::UnboundInt | Kind::UnboundFloat | Kind::UnboundComplex)
    }

    /// Concrete kind used to check operator eligibility.
    ///
    /// Unbound markers map to int64/float64/complex128; bound kinds map to themselves.
    pub fn real_kind(self) -> Kind {
        match self {
            Kind::UnboundInt => Kind::Int64,
            Kind::UnboundFloat => Kind::Float64,
            Kind::UnboundComplex => Kind::Complex128,
            kind => kind,
        }
    }

    pub fn is_signed_int(self) -> bool {
        BITS_ALL_INT & self.bit() != 0
    }

    pub fn is_unsigned_int(self) -> bool {
        BITS_ALL_UINT & self.bit() != 0
    }

    pub fn is_integer(self) -> bool {
        BITS_ALL_INT_UINT & self.bit() != 0
    }

    pub fn is_float(self) -> bool {
        BITS_ALL_FLOAT & self.bit() != 0
    }

    pub fn is_complex(self) -> bool {
        BITS_ALL_COMPLEX & self.bit() != 0
    }

    /// Integer and float kinds.
    pub fn is_real(self) -> bool {
        BITS_ALL_REAL & self.bit() != 0
    }

    pub fn is_number(self) -> bool {
        BITS_ALL_NUMBER & self.bit() != 0
    }

    /// Kinds that have a basic (non-composite) runtime type.
    pub fn is_basic(self) -> bool {
        self == Kind::Bool
            || self == Kind::String
            || self == Kind::UnsafePointer
            || self.is_number()
    }

    /// Type name as written in source, or a descriptive name for the markers.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Uintptr => "uintptr",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Complex64 => "complex64",
            Kind::Complex128 => "complex128",
            Kind::Array => "array",
            Kind::Chan => "chan",
            Kind::Func => "func",
            Kind::Interface => "interface",
            Kind::Map => "map",
            Kind::Ptr => "ptr",
            Kind::Slice => "slice",
            Kind::String => "string",
            Kind::Struct => "struct",
            Kind::UnsafePointer => "unsafe.Pointer",
            Kind::UnboundInt => "untyped int",
            Kind::UnboundFloat => "untyped float",
            Kind::UnboundComplex => "untyped complex",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_and_unbound_partition() {
        assert!(Kind::Int.is_bound());
        assert!(Kind::UnsafePointer.is_bound());
        assert!(!Kind::UnboundInt.is_bound());
        assert!(Kind::UnboundComplex.is_unbound());
        assert!(!Kind::String.is_unbound());
    }

    #[test]
    fn test_unbound_promotion_order() {
        assert!(Kind::UnboundInt < Kind::UnboundFloat);
        assert!(Kind::UnboundFloat < Kind::UnboundComplex);
    }

    #[test]
    fn test_real_kind_defaults() {
        assert_eq!(Kind::UnboundInt.real_kind(), Kind::Int64);
        assert_eq!(Kind::UnboundFloat.real_kind(), Kind::Float64);
        assert_eq!(Kind::UnboundComplex.real_kind(), Kind::Complex128);
        assert_eq!(Kind::Int8.real_kind(), Kind::Int8);
    }

    #[test]
    fn test_masks() {
        assert_ne!(BITS_ALL_INT & Kind::Int32.bit(), 0);
        assert_eq!(BITS_ALL_INT & Kind::Uint32.bit(), 0);
        assert_ne!(BITS_ALL_NUMBER & Kind::Complex64.bit(), 0);
        assert_eq!(BITS_ALL_NUMBER & Kind::String.bit(), 0);
        assert!(Kind::Uintptr.is_unsigned_int());
        assert!(Kind::Float32.is_real());
        assert!(!Kind::Complex128.is_real());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Kind::Float64.to_string(), "float64");
        assert_eq!(Kind::UnboundFloat.to_string(), "untyped float");
    }
}
