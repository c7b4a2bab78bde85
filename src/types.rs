//! The Canonical ABI type descriptor table.
//!
//! [`ValType`] is a closed tagged union over every shape the wire format
//! knows how to lay out. It carries no values; see [`crate::value::Value`]
//! for the matching runtime payload.

/// A Canonical ABI type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum ValType {
    Bool,
    S8,
    U8,
    S16,
    U16,
    S32,
    U32,
    S64,
    U64,
    F32,
    F64,
    Char,
    String,
    /// An unbounded list, or a fixed-length inline list when `len` is `Some`.
    List { element: Box<ValType>, len: Option<u32> },
    Record(Vec<(String, ValType)>),
    Tuple(Vec<ValType>),
    /// `option<T>`, represented as a two-case variant (`none`, `some(T)`).
    Option(Box<ValType>),
    /// `result<T, E>`, represented as a two-case variant (`ok(T?)`, `err(E?)`).
    Result { ok: Option<Box<ValType>>, err: Option<Box<ValType>> },
    /// An all-unit-case variant: case names carry no payload.
    Enum(Vec<String>),
    /// A general tagged union; a case name paired with an optional payload type.
    Variant(Vec<(String, Option<ValType>)>),
    /// A bit-packed set of named boolean flags.
    Flags(Vec<String>),
}

/// String wire encoding. Only the two encodings the Canonical ABI requires
/// every implementation to support are offered; `latin1+utf16` is
/// deliberately not modelled (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    Utf8,
    Utf16Le,
}

impl ValType {
    pub fn record(fields: impl IntoIterator<Item = (impl Into<String>, ValType)>) -> Self {
        ValType::Record(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }

    pub fn tuple(elems: impl IntoIterator<Item = ValType>) -> Self {
        ValType::Tuple(elems.into_iter().collect())
    }

    pub fn list(element: ValType) -> Self {
        ValType::List { element: Box::new(element), len: None }
    }

    pub fn fixed_list(element: ValType, len: u32) -> Self {
        ValType::List { element: Box::new(element), len: Some(len) }
    }

    pub fn option(inner: ValType) -> Self {
        ValType::Option(Box::new(inner))
    }

    pub fn result(ok: Option<ValType>, err: Option<ValType>) -> Self {
        ValType::Result { ok: ok.map(Box::new), err: err.map(Box::new) }
    }

    pub fn enum_(cases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ValType::Enum(cases.into_iter().map(Into::into).collect())
    }

    pub fn variant(cases: impl IntoIterator<Item = (impl Into<String>, Option<ValType>)>) -> Self {
        ValType::Variant(cases.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }

    pub fn flags(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ValType::Flags(names.into_iter().map(Into::into).collect())
    }

    /// Is this a primitive type (fixed-size, no indirection, no case analysis)?
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ValType::Bool
                | ValType::S8
                | ValType::U8
                | ValType::S16
                | ValType::U16
                | ValType::S32
                | ValType::U32
                | ValType::S64
                | ValType::U64
                | ValType::F32
                | ValType::F64
                | ValType::Char
        )
    }
}
