//! Composite codec (component D).
//!
//! Dispatches [`lift`]/[`lower`] across the full type descriptor table.
//! Primitives are handled directly against [`crate::memory`]; strings,
//! lists, records/tuples, and variants/options/results/enums/flags each get
//! their own submodule.

pub mod list;
pub mod record;
pub mod string;
pub mod variant;

use crate::alloc::{Realloc, ReleaseChain};
use crate::error::{Error, Result};
use crate::memory::{self, LinearMemory};
use crate::types::{StringEncoding, ValType};
use crate::value::Value;

/// Read a value of type `ty` out of `mem` at `addr`.
pub fn lift<M: LinearMemory>(
    mem: &M,
    ty: &ValType,
    addr: u32,
    encoding: StringEncoding,
) -> Result<Value> {
    match ty {
        ValType::Bool => Ok(Value::Bool(memory::load_bool(mem, addr)?)),
        ValType::S8 => Ok(Value::S8(memory::load_i8(mem, addr)?)),
        ValType::U8 => Ok(Value::U8(memory::load_u8(mem, addr)?)),
        ValType::S16 => Ok(Value::S16(memory::load_i16(mem, addr)?)),
        ValType::U16 => Ok(Value::U16(memory::load_u16(mem, addr)?)),
        ValType::S32 => Ok(Value::S32(memory::load_i32(mem, addr)?)),
        ValType::U32 => Ok(Value::U32(memory::load_u32(mem, addr)?)),
        ValType::S64 => Ok(Value::S64(memory::load_i64(mem, addr)?)),
        ValType::U64 => Ok(Value::U64(memory::load_u64(mem, addr)?)),
        ValType::F32 => Ok(Value::F32(memory::load_f32(mem, addr)?)),
        ValType::F64 => Ok(Value::F64(memory::load_f64(mem, addr)?)),
        ValType::Char => Ok(Value::Char(memory::load_char(mem, addr)?)),
        ValType::String => string::lift(mem, addr, encoding),
        ValType::List { element, len } => list::lift(mem, element, *len, addr, encoding),
        ValType::Record(fields) => record::lift_record(mem, fields, addr, encoding),
        ValType::Tuple(elems) => record::lift_tuple(mem, elems, addr, encoding),
        ValType::Option(inner) => variant::lift_option(mem, inner, addr, encoding),
        ValType::Result { ok, err } => variant::lift_result(mem, ok, err, addr, encoding),
        ValType::Enum(cases) => variant::lift_enum(mem, cases, addr),
        ValType::Variant(cases) => variant::lift_variant(mem, cases, addr, encoding),
        ValType::Flags(names) => variant::lift_flags(mem, names, addr),
    }
}

/// Write `value` (which must match `ty`'s shape) into `mem` at `addr`,
/// allocating auxiliary storage (string/list backing buffers) through
/// `realloc` as needed. Allocations are recorded in `chain` so the caller
/// can unwind them if a later part of the same call fails.
pub fn lower<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    ty: &ValType,
    value: &Value,
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    if !value.matches_shape(ty) {
        return Err(Error::type_mismatch(format!("value does not match type {ty:?}")));
    }
    match (ty, value) {
        (ValType::Bool, Value::Bool(v)) => memory::store_bool(mem, addr, *v),
        (ValType::S8, Value::S8(v)) => memory::store_i8(mem, addr, *v),
        (ValType::U8, Value::U8(v)) => memory::store_u8(mem, addr, *v),
        (ValType::S16, Value::S16(v)) => memory::store_i16(mem, addr, *v),
        (ValType::U16, Value::U16(v)) => memory::store_u16(mem, addr, *v),
        (ValType::S32, Value::S32(v)) => memory::store_i32(mem, addr, *v),
        (ValType::U32, Value::U32(v)) => memory::store_u32(mem, addr, *v),
        (ValType::S64, Value::S64(v)) => memory::store_i64(mem, addr, *v),
        (ValType::U64, Value::U64(v)) => memory::store_u64(mem, addr, *v),
        (ValType::F32, Value::F32(v)) => memory::store_f32(mem, addr, *v),
        (ValType::F64, Value::F64(v)) => memory::store_f64(mem, addr, *v),
        (ValType::Char, Value::Char(v)) => memory::store_char(mem, addr, *v),
        (ValType::String, Value::String(s)) => string::lower(mem, realloc, chain, s, addr, encoding),
        (ValType::List { element, len }, Value::List(items)) => {
            list::lower(mem, realloc, chain, element, *len, items, addr, encoding)
        }
        (ValType::Record(fields), Value::Record(field_values)) => {
            record::lower_record(mem, realloc, chain, fields, field_values, addr, encoding)
        }
        (ValType::Tuple(elems), Value::Tuple(items)) => {
            record::lower_tuple(mem, realloc, chain, elems, items, addr, encoding)
        }
        (ValType::Option(inner), Value::Option(v)) => {
            variant::lower_option(mem, realloc, chain, inner, v.as_deref(), addr, encoding)
        }
        (ValType::Result { ok, err }, Value::Result(v)) => {
            variant::lower_result(mem, realloc, chain, ok, err, v, addr, encoding)
        }
        (ValType::Enum(cases), Value::Enum(name)) => variant::lower_enum(mem, cases, name, addr),
        (ValType::Variant(cases), Value::Variant(name, payload)) => {
            variant::lower_variant(mem, realloc, chain, cases, name, payload.as_deref(), addr, encoding)
        }
        (ValType::Flags(names), Value::Flags(set)) => variant::lower_flags(mem, names, set, addr),
        _ => Err(Error::type_mismatch("value shape check passed but codec dispatch did not match")),
    }
}
