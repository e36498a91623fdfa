use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::exec::kind::Kind;

/// Runtime type of a bound value.
///
/// Types are immutable and cheap to clone. Two types are identical when
/// they are structurally equal; named types compare by package path and name.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Type(Arc<Repr>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum Repr {
    Basic(Kind),
    Named {
        pkg_path: String,
        name: String,
        underlying: Type,
    },
    Array {
        len: usize,
        elem: Type,
    },
    Slice(Type),
    Map {
        key: Type,
        elem: Type,
    },
    Ptr(Type),
    Chan(Type),
    Func(Signature),
    /// Only the empty interface is modeled structurally.
    Interface,
    Struct(Vec<Field>),
}

/// Parameter and result lists of a function type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// The last parameter is a `...T` slice.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

macro_rules! basic_types {
    ($($ctor:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $ctor() -> Type {
                static T: LazyLock<Type> = LazyLock::new(|| Type(Arc::new(Repr::Basic(Kind::$kind))));
                T.clone()
            }
        )*
    };
}

impl Type {
    basic_types! {
        bool => Bool,
        int => Int,
        int8 => Int8,
        int16 => Int16,
        int32 => Int32,
        int64 => Int64,
        uint => Uint,
        uint8 => Uint8,
        uint16 => Uint16,
        uint32 => Uint32,
        uint64 => Uint64,
        uintptr => Uintptr,
        float32 => Float32,
        float64 => Float64,
        complex64 => Complex64,
        complex128 => Complex128,
        string => String,
        unsafe_pointer => UnsafePointer,
    }

    /// The universal `interface{}` type.
    pub fn empty_interface() -> Type {
        static T: LazyLock<Type> = LazyLock::new(|| Type(Arc::new(Repr::Interface)));
        T.clone()
    }

    /// Basic type of a bound basic kind; `None` for composite kinds and markers.
    pub fn from_kind(kind: Kind) -> Option<Type> {
        Some(match kind {
            Kind::Bool => Type::bool(),
            Kind::Int => Type::int(),
            Kind::Int8 => Type::int8(),
            Kind::Int16 => Type::int16(),
            Kind::Int32 => Type::int32(),
            Kind::Int64 => Type::int64(),
            Kind::Uint => Type::uint(),
            Kind::Uint8 => Type::uint8(),
            Kind::Uint16 => Type::uint16(),
            Kind::Uint32 => Type::uint32(),
            Kind::Uint64 => Type::uint64(),
            Kind::Uintptr => Type::uintptr(),
            Kind::Float32 => Type::float32(),
            Kind::Float64 => Type::float64(),
            Kind::Complex64 => Type::complex64(),
            Kind::Complex128 => Type::complex128(),
            Kind::String => Type::string(),
            Kind::UnsafePointer => Type::unsafe_pointer(),
            Kind::Interface => Type::empty_interface(),
            _ => return None,
        })
    }

    pub fn named(pkg_path: impl Into<String>, name: impl Into<String>, underlying: Type) -> Type {
        // A named type's underlying type is never itself named.
        let underlying = underlying.underlying();
        Type(Arc::new(Repr::Named {
            pkg_path: pkg_path.into(),
            name: name.into(),
            underlying,
        }))
    }

    pub fn array(len: usize, elem: Type) -> Type {
        Type(Arc::new(Repr::Array { len, elem }))
    }

    pub fn slice(elem: Type) -> Type {
        Type(Arc::new(Repr::Slice(elem)))
    }

    pub fn map(key: Type, elem: Type) -> Type {
        Type(Arc::new(Repr::Map { key, elem }))
    }

    pub fn ptr(elem: Type) -> Type {
        Type(Arc::new(Repr::Ptr(elem)))
    }

    pub fn chan(elem: Type) -> Type {
        Type(Arc::new(Repr::Chan(elem)))
    }

    pub fn func(params: Vec<Type>, results: Vec<Type>, variadic: bool) -> Type {
        Type(Arc::new(Repr::Func(Signature { params, results, variadic })))
    }

    pub fn structure(fields: Vec<Field>) -> Type {
        Type(Arc::new(Repr::Struct(fields)))
    }

    pub fn kind(&self) -> Kind {
        match &*self.0 {
            Repr::Basic(kind) => *kind,
            Repr::Named { underlying, .. } => underlying.kind(),
            Repr::Array { .. } => Kind::Array,
            Repr::Slice(_) => Kind::Slice,
            Repr::Map { .. } => Kind::Map,
            Repr::Ptr(_) => Kind::Ptr,
            Repr::Chan(_) => Kind::Chan,
            Repr::Func(_) => Kind::Func,
            Repr::Interface => Kind::Interface,
            Repr::Struct(_) => Kind::Struct,
        }
    }

    pub fn underlying(&self) -> Type {
        match &*self.0 {
            Repr::Named { underlying, .. } => underlying.clone(),
            _ => self.clone(),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(&*self.0, Repr::Named { .. })
    }

    pub fn is_empty_interface(&self) -> bool {
        matches!(&*self.0, Repr::Interface)
    }

    /// Name and package path of a named type.
    pub fn name(&self) -> Option<(&str, &str)> {
        match &*self.0 {
            Repr::Named { pkg_path, name, .. } => Some((pkg_path, name)),
            _ => None,
        }
    }

    /// Element type of arrays, slices, maps, pointers and channels.
    pub fn elem(&self) -> Option<Type> {
        match &*self.underlying().0 {
            Repr::Array { elem, .. } | Repr::Map { elem, .. } => Some(elem.clone()),
            Repr::Slice(elem) | Repr::Ptr(elem) | Repr::Chan(elem) => Some(elem.clone()),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<Type> {
        match &*self.underlying().0 {
            Repr::Map { key, .. } => Some(key.clone()),
            _ => None,
        }
    }

    pub fn array_len(&self) -> Option<usize> {
        match &*self.underlying().0 {
            Repr::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<Vec<Field>> {
        match &*self.underlying().0 {
            Repr::Struct(fields) => Some(fields.clone()),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<Signature> {
        match &*self.underlying().0 {
            Repr::Func(sig) => Some(sig.clone()),
            _ => None,
        }
    }

    pub fn num_in(&self) -> usize {
        self.signature().map_or(0, |sig| sig.params.len())
    }

    pub fn num_out(&self) -> usize {
        self.signature().map_or(0, |sig| sig.results.len())
    }

    /// Type of the i'th parameter.
    ///
    /// # Panics
    /// Panics if this is not a function type or `i` is out of range.
    pub fn in_(&self, i: usize) -> Type {
        match self.signature() {
            Some(sig) if i < sig.params.len() => sig.params[i].clone(),
            _ => panic!("Type::in_: no parameter {} in {}", i, self),
        }
    }

    /// Type of the i'th result.
    ///
    /// # Panics
    /// Panics if this is not a function type or `i` is out of range.
    pub fn out(&self, i: usize) -> Type {
        match self.signature() {
            Some(sig) if i < sig.results.len() => sig.results[i].clone(),
            _ => panic!("Type::out: no result {} in {}", i, self),
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.signature().is_some_and(|sig| sig.variadic)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Repr::Basic(kind) => f.write_str(kind.name()),
            Repr::Named { pkg_path, name, .. } => match pkg_path.rsplit('/').next() {
                Some(pkg) if !pkg.is_empty() => write!(f, "{}.{}", pkg, name),
                _ => f.write_str(name),
            },
            Repr::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            Repr::Slice(elem) => write!(f, "[]{}", elem),
            Repr::Map { key, elem } => write!(f, "map[{}]{}", key, elem),
            Repr::Ptr(elem) => write!(f, "*{}", elem),
            Repr::Chan(elem) => write!(f, "chan {}", elem),
            Repr::Func(sig) => {
                f.write_str("func")?;
                write_signature(f, sig)
            }
            Repr::Interface => f.write_str("interface{}"),
            Repr::Struct(fields) => {
                f.write_str("struct {")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, " {} {}", field.name, field.ty)?;
                }
                if !fields.is_empty() {
                    f.write_str(" ")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_signature(f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
    f.write_str("(")?;
    for (i, param) in sig.params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        if sig.variadic && i + 1 == sig.params.len() {
            match param.elem() {
                Some(elem) => write!(f, "...{}", elem)?,
                None => write!(f, "...{}", param)?,
            }
        } else {
            write!(f, "{}", param)?;
        }
    }
    f.write_str(")")?;
    match sig.results.len() {
        0 => Ok(()),
        1 => write!(f, " {}", sig.results[0]),
        _ => {
            f.write_str(" (")?;
            for (i, result) in sig.results.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", result)?;
            }
            f.write_str(")")
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}
