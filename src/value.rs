//! Runtime values matching the [`crate::types::ValType`] descriptor table.

use crate::types::ValType;

/// A value lifted from, or about to be lowered into, linear memory.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    S8(i8),
    U8(u8),
    S16(i16),
    U16(u16),
    S32(i32),
    U32(u32),
    S64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    List(Vec<Value>),
    Record(Vec<(String, Value)>),
    Tuple(Vec<Value>),
    Option(Option<Box<Value>>),
    /// `result<T, E>`: `Ok` payload is absent when `T` is `()` / unit result.
    Result(core::result::Result<Option<Box<Value>>, Option<Box<Value>>>),
    /// The selected case name of an [`ValType::Enum`].
    Enum(String),
    /// The selected case name plus its payload, for an [`ValType::Variant`].
    Variant(String, Option<Box<Value>>),
    /// The set of flag names currently set.
    Flags(Vec<String>),
}

impl Value {
    /// Does this value's shape match the given type's shape? Shallow check:
    /// verifies tags and case names agree, not full structural equality of
    /// nested element types (that is the codec's job at lift/lower time).
    pub fn matches_shape(&self, ty: &ValType) -> bool {
        match (self, ty) {
            (Value::Bool(_), ValType::Bool)
            | (Value::S8(_), ValType::S8)
            | (Value::U8(_), ValType::U8)
            | (Value::S16(_), ValType::S16)
            | (Value::U16(_), ValType::U16)
            | (Value::S32(_), ValType::S32)
            | (Value::U32(_), ValType::U32)
            | (Value::S64(_), ValType::S64)
            | (Value::U64(_), ValType::U64)
            | (Value::F32(_), ValType::F32)
            | (Value::F64(_), ValType::F64)
            | (Value::Char(_), ValType::Char)
            | (Value::String(_), ValType::String) => true,
            (Value::List(_), ValType::List { .. }) => true,
            (Value::Record(fields), ValType::Record(decl)) => fields.len() == decl.len(),
            (Value::Tuple(items), ValType::Tuple(decl)) => items.len() == decl.len(),
            (Value::Option(_), ValType::Option(_)) => true,
            (Value::Result(_), ValType::Result { .. }) => true,
            (Value::Enum(name), ValType::Enum(cases)) => cases.iter().any(|c| c == name),
            (Value::Variant(name, _), ValType::Variant(cases)) => {
                cases.iter().any(|(c, _)| c == name)
            }
            (Value::Flags(names), ValType::Flags(decl)) => {
                names.iter().all(|n| decl.contains(n))
            }
            _ => false,
        }
    }
}
