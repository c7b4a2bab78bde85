//! Parameter flattener (component E).
//!
//! A value passed across the Canonical ABI boundary is either passed as a
//! short list of core WebAssembly values ("flat") or, once that list would
//! grow past [`MAX_FLAT_PARAMS`], written into a freshly allocated block of
//! linear memory and passed as a single pointer ("indirect spill").
//!
//! The hardest rule here is how a variant's cases share one flat slot
//! layout: every case's payload is flattened independently, the resulting
//! per-slot core types are joined pairwise across all cases (narrower types
//! widen to the join), and a case that produces fewer slots than the
//! unified shape pads the remainder with zero. This mirrors how a record's
//! fields are flattened and concatenated, except a variant's cases don't
//! concatenate; they share the same slots, since only one case is ever
//! active at a time.

use crate::alloc::{Realloc, ReleaseChain};
use crate::codec::{list, string};
use crate::error::{Error, Result};
use crate::layout::layout_of;
use crate::memory::{self, LinearMemory};
use crate::types::{StringEncoding, ValType};
use crate::value::Value;

/// Maximum number of flat core values a parameter list may occupy before
/// the caller must spill to an indirect pointer instead.
pub const MAX_FLAT_PARAMS: usize = 16;

/// A core WebAssembly value type, as the wasm-level function signature sees
/// it once a component-level type has been flattened down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatType {
    I32,
    I64,
    F32,
    F64,
}

/// One core-level flat value. Integers are always carried zero-extended in
/// the lower bits of the `u64`; floats are carried by bit pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatValue {
    pub ty: FlatType,
    pub bits: u64,
}

impl FlatValue {
    fn i32(v: u32) -> Self {
        Self { ty: FlatType::I32, bits: v as u64 }
    }
    fn i64(v: u64) -> Self {
        Self { ty: FlatType::I64, bits: v }
    }
    fn f32(v: f32) -> Self {
        Self { ty: FlatType::F32, bits: v.to_bits() as u64 }
    }
    fn f64(v: f64) -> Self {
        Self { ty: FlatType::F64, bits: v.to_bits() }
    }
}

/// The join of two core types sharing one flat slot across variant cases.
/// Matches the Canonical ABI's flattening join rule: identical types stay
/// as-is, a 32-bit int/float pair shares an `i32` slot (the float's bits
/// reinterpreted), and every other mismatch widens to `i64` (the only slot
/// wide enough to carry either bit pattern regardless of domain).
fn join(a: FlatType, b: FlatType) -> FlatType {
    use FlatType::*;
    match (a, b) {
        (x, y) if x == y => x,
        (I32, F32) | (F32, I32) => I32,
        _ => I64,
    }
}

/// Place a value produced under its own case type into the shared slot type
/// `to`, by bit reinterpretation and zero-extension rather than numeric
/// conversion, matching how the Canonical ABI packs mismatched variant
/// case payloads into one core value slot.
fn coerce(value: FlatValue, to: FlatType) -> FlatValue {
    if value.ty == to {
        return value;
    }
    match to {
        FlatType::I32 => FlatValue::i32(value.bits as u32),
        FlatType::I64 => FlatValue::i64(value.bits),
        _ => value,
    }
}

fn case_list(ty: &ValType) -> Option<Vec<(String, Option<ValType>)>> {
    match ty {
        ValType::Variant(cases) => Some(cases.clone()),
        ValType::Enum(cases) => Some(cases.iter().map(|c| (c.clone(), None)).collect()),
        ValType::Option(inner) => {
            Some(vec![("none".to_string(), None), ("some".to_string(), Some((**inner).clone()))])
        }
        ValType::Result { ok, err } => Some(vec![
            ("ok".to_string(), ok.as_deref().cloned()),
            ("err".to_string(), err.as_deref().cloned()),
        ]),
        _ => None,
    }
}

fn unified_case_slots(cases: &[(String, Option<ValType>)]) -> Vec<FlatType> {
    let mut slots: Vec<FlatType> = Vec::new();
    for (_, payload) in cases {
        if let Some(ty) = payload {
            for (i, t) in flat_types(ty).into_iter().enumerate() {
                match slots.get(i).copied() {
                    Some(existing) => slots[i] = join(existing, t),
                    None => slots.push(t),
                }
            }
        }
    }
    slots
}

/// The sequence of core value slots `ty` flattens to.
pub fn flat_types(ty: &ValType) -> Vec<FlatType> {
    use ValType::*;
    match ty {
        Bool | S8 | U8 | S16 | U16 | S32 | U32 | Char => vec![FlatType::I32],
        S64 | U64 => vec![FlatType::I64],
        F32 => vec![FlatType::F32],
        F64 => vec![FlatType::F64],
        String => vec![FlatType::I32, FlatType::I32],
        List { len: None, .. } => vec![FlatType::I32, FlatType::I32],
        List { element, len: Some(n) } => {
            let elem_flat = flat_types(element);
            elem_flat.iter().cloned().cycle().take(elem_flat.len() * *n as usize).collect()
        }
        Record(fields) => fields.iter().flat_map(|(_, t)| flat_types(t)).collect(),
        Tuple(elems) => elems.iter().flat_map(flat_types).collect(),
        Flags(names) => vec![FlatType::I32; names.len().div_ceil(32).max(usize::from(!names.is_empty()))],
        Variant(_) | Enum(_) | Option(_) | Result { .. } => {
            let cases = case_list(ty).expect("variant-shaped type");
            let mut slots = vec![FlatType::I32];
            slots.extend(unified_case_slots(&cases));
            slots
        }
    }
}

/// Flatten `value` (which must have type `ty`) to a sequence of core
/// values, allocating backing storage for any string/list payloads via
/// `realloc`.
pub fn lower_flat<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    ty: &ValType,
    value: &Value,
    encoding: StringEncoding,
) -> Result<Vec<FlatValue>> {
    if !value.matches_shape(ty) {
        return Err(Error::type_mismatch(format!("value does not match type {ty:?}")));
    }
    match (ty, value) {
        (ValType::Bool, Value::Bool(v)) => Ok(vec![FlatValue::i32(*v as u32)]),
        (ValType::S8, Value::S8(v)) => Ok(vec![FlatValue::i32(*v as i32 as u32)]),
        (ValType::U8, Value::U8(v)) => Ok(vec![FlatValue::i32(*v as u32)]),
        (ValType::S16, Value::S16(v)) => Ok(vec![FlatValue::i32(*v as i32 as u32)]),
        (ValType::U16, Value::U16(v)) => Ok(vec![FlatValue::i32(*v as u32)]),
        (ValType::S32, Value::S32(v)) => Ok(vec![FlatValue::i32(*v as u32)]),
        (ValType::U32, Value::U32(v)) => Ok(vec![FlatValue::i32(*v)]),
        (ValType::S64, Value::S64(v)) => Ok(vec![FlatValue::i64(*v as u64)]),
        (ValType::U64, Value::U64(v)) => Ok(vec![FlatValue::i64(*v)]),
        (ValType::F32, Value::F32(v)) => Ok(vec![FlatValue::f32(*v)]),
        (ValType::F64, Value::F64(v)) => Ok(vec![FlatValue::f64(*v)]),
        (ValType::Char, Value::Char(v)) => Ok(vec![FlatValue::i32(*v as u32)]),
        (ValType::String, Value::String(s)) => {
            let (bytes, len, align) = string::encode(s, encoding);
            let ptr = string::allocate_and_write(mem, realloc, chain, &bytes, align)?;
            Ok(vec![FlatValue::i32(ptr), FlatValue::i32(len)])
        }
        (ValType::List { element, len: None }, Value::List(items)) => {
            let (ptr, count) = list::write_unbounded(mem, realloc, chain, element, items, encoding)?;
            Ok(vec![FlatValue::i32(ptr), FlatValue::i32(count)])
        }
        (ValType::List { element, len: Some(n) }, Value::List(items)) => {
            if items.len() as u32 != *n {
                return Err(Error::type_mismatch("fixed-length list arity mismatch"));
            }
            let mut out = Vec::new();
            for item in items {
                out.extend(lower_flat(mem, realloc, chain, element, item, encoding)?);
            }
            Ok(out)
        }
        (ValType::Record(fields), Value::Record(values)) => {
            let mut out = Vec::new();
            for ((_, fty), (_, fval)) in fields.iter().zip(values.iter()) {
                out.extend(lower_flat(mem, realloc, chain, fty, fval, encoding)?);
            }
            Ok(out)
        }
        (ValType::Tuple(elems), Value::Tuple(items)) => {
            let mut out = Vec::new();
            for (ety, item) in elems.iter().zip(items.iter()) {
                out.extend(lower_flat(mem, realloc, chain, ety, item, encoding)?);
            }
            Ok(out)
        }
        (ValType::Flags(names), Value::Flags(set)) => Ok(lower_flags_flat(names, set)?),
        _ => lower_variant_like_flat(mem, realloc, chain, ty, value, encoding),
    }
}

fn lower_flags_flat(names: &[String], set: &[String]) -> Result<Vec<FlatValue>> {
    let word_count = names.len().div_ceil(32).max(usize::from(!names.is_empty()));
    let mut words = vec![0u32; word_count];
    for name in set {
        let index = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::type_mismatch(format!("unknown flag `{name}`")))?;
        words[index / 32] |= 1 << (index % 32);
    }
    Ok(words.into_iter().map(FlatValue::i32).collect())
}

fn lower_variant_like_flat<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    ty: &ValType,
    value: &Value,
    encoding: StringEncoding,
) -> Result<Vec<FlatValue>> {
    let cases = case_list(ty).ok_or_else(|| Error::type_mismatch("not a variant-shaped type"))?;
    let (case_name, payload): (String, Option<&Value>) = match value {
        Value::Enum(name) => (name.clone(), None),
        Value::Variant(name, payload) => (name.clone(), payload.as_deref()),
        Value::Option(v) => match v {
            None => ("none".to_string(), None),
            Some(inner) => ("some".to_string(), Some(inner.as_ref())),
        },
        Value::Result(r) => match r {
            Ok(v) => ("ok".to_string(), v.as_deref()),
            Err(v) => ("err".to_string(), v.as_deref()),
        },
        _ => return Err(Error::type_mismatch("value is not variant-shaped")),
    };
    let index = cases
        .iter()
        .position(|(name, _)| name == &case_name)
        .ok_or_else(|| Error::type_mismatch(format!("unknown case `{case_name}`")))?;

    let unified = unified_case_slots(&cases);
    let case_values = match (&cases[index].1, payload) {
        (None, None) => Vec::new(),
        (Some(payload_ty), Some(v)) => lower_flat(mem, realloc, chain, payload_ty, v, encoding)?,
        (None, Some(_)) => return Err(Error::type_mismatch("case carries no payload")),
        (Some(_), None) => return Err(Error::type_mismatch("case requires a payload")),
    };

    let mut out = Vec::with_capacity(1 + unified.len());
    out.push(FlatValue::i32(index as u32));
    for (i, slot_ty) in unified.iter().enumerate() {
        out.push(match case_values.get(i) {
            Some(v) => coerce(*v, *slot_ty),
            None => zero(*slot_ty),
        });
    }
    Ok(out)
}

fn zero(ty: FlatType) -> FlatValue {
    match ty {
        FlatType::I32 => FlatValue::i32(0),
        FlatType::I64 => FlatValue::i64(0),
        FlatType::F32 => FlatValue::f32(0.0),
        FlatType::F64 => FlatValue::f64(0.0),
    }
}

/// The outcome of flattening a parameter list: either the flat core values
/// themselves, or a single pointer to a spilled, record-laid-out block.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatParams {
    Flat(Vec<FlatValue>),
    Indirect(u32),
}

/// Lower a parameter list, spilling to memory via `realloc` when the total
/// flat slot count would exceed [`MAX_FLAT_PARAMS`].
pub fn lower_params<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    param_types: &[ValType],
    values: &[Value],
    encoding: StringEncoding,
) -> Result<FlatParams> {
    if param_types.len() != values.len() {
        return Err(Error::type_mismatch("parameter count mismatch"));
    }
    let total_slots: usize = param_types.iter().map(|t| flat_types(t).len()).sum();

    if total_slots <= MAX_FLAT_PARAMS {
        let mut out = Vec::with_capacity(total_slots);
        for (ty, value) in param_types.iter().zip(values.iter()) {
            out.extend(lower_flat(mem, realloc, chain, ty, value, encoding)?);
        }
        return Ok(FlatParams::Flat(out));
    }

    // Indirect spill: write every parameter into one freshly allocated
    // block using the same field-layout rule as a record/tuple, then pass
    // a single pointer.
    let record_layout = crate::layout::layout_of(&ValType::Tuple(param_types.to_vec()));
    let offsets = crate::layout::field_offsets(param_types.iter());
    let ptr = if record_layout.size == 0 {
        0
    } else {
        chain.allocate(realloc, record_layout.size, record_layout.align.max(1))?
    };
    for ((ty, value), offset) in param_types.iter().zip(values.iter()).zip(offsets) {
        crate::codec::lower(mem, realloc, chain, ty, value, ptr + offset, encoding)?;
    }
    Ok(FlatParams::Indirect(ptr))
}
