//! Variant family codec: general variants, and the `option`/`result`/`enum`
//! shapes that are each a constrained special case of a variant.
//!
//! The rule this module exists to get right: a variant's payload offset and
//! alignment are computed from the MAXIMUM size/alignment across *all*
//! cases, never just the case that happens to be active in a particular
//! value. Two values of the same variant type, carrying different cases,
//! must still place their payload at the same fixed offset, otherwise a
//! reader cannot locate the payload without first decoding the discriminant
//! out of band, which is not how the wire format works.

use crate::alloc::{Realloc, ReleaseChain};
use crate::error::{Error, Result};
use crate::layout::{discriminant_size, flags_byte_len, variant_payload_offset};
use crate::memory::{self, LinearMemory};
use crate::types::{StringEncoding, ValType};
use crate::value::Value;

fn read_discriminant<M: LinearMemory>(mem: &M, addr: u32, case_count: usize) -> Result<u32> {
    match discriminant_size(case_count) {
        0 => Ok(0),
        1 => Ok(memory::load_u8(mem, addr)? as u32),
        2 => Ok(memory::load_u16(mem, addr)? as u32),
        4 => memory::load_u32(mem, addr),
        _ => unreachable!("discriminant_size only returns 0, 1, 2, or 4"),
    }
}

fn write_discriminant<M: LinearMemory>(mem: &mut M, addr: u32, case_count: usize, index: u32) -> Result<()> {
    match discriminant_size(case_count) {
        0 => Ok(()),
        1 => memory::store_u8(mem, addr, index as u8),
        2 => memory::store_u16(mem, addr, index as u16),
        4 => memory::store_u32(mem, addr, index),
        _ => unreachable!("discriminant_size only returns 0, 1, 2, or 4"),
    }
}

/// Shared lift logic for anything shaped like a variant: given the case
/// list (name, optional payload type), read the discriminant, validate it,
/// and lift the active case's payload (if any) from the shared payload
/// offset.
fn lift_cases<M: LinearMemory>(
    mem: &M,
    cases: &[(String, Option<ValType>)],
    addr: u32,
    encoding: StringEncoding,
) -> Result<(usize, Option<Value>)> {
    let discriminant = read_discriminant(mem, addr, cases.len())?;
    let index = discriminant as usize;
    let (_, payload_ty) = cases
        .get(index)
        .ok_or_else(|| Error::ill_formed_discriminant(discriminant, cases.len()))?;
    let payload = match payload_ty {
        None => None,
        Some(ty) => {
            let offset = variant_payload_offset(cases.iter().map(|(_, t)| t));
            Some(super::lift(mem, ty, addr + offset, encoding)?)
        }
    };
    Ok((index, payload))
}

#[allow(clippy::too_many_arguments)]
fn lower_cases<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    cases: &[(String, Option<ValType>)],
    case_name: &str,
    payload: Option<&Value>,
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    let index = cases
        .iter()
        .position(|(name, _)| name == case_name)
        .ok_or_else(|| Error::type_mismatch(format!("unknown case `{case_name}`")))?;
    write_discriminant(mem, addr, cases.len(), index as u32)?;
    let (_, payload_ty) = &cases[index];
    match (payload_ty, payload) {
        (None, None) => Ok(()),
        (Some(ty), Some(value)) => {
            let offset = variant_payload_offset(cases.iter().map(|(_, t)| t));
            super::lower(mem, realloc, chain, ty, value, addr + offset, encoding)
        }
        (None, Some(_)) => Err(Error::type_mismatch(format!("case `{case_name}` carries no payload"))),
        (Some(_), None) => Err(Error::type_mismatch(format!("case `{case_name}` requires a payload"))),
    }
}

pub fn lift_variant<M: LinearMemory>(
    mem: &M,
    cases: &[(String, Option<ValType>)],
    addr: u32,
    encoding: StringEncoding,
) -> Result<Value> {
    let (index, payload) = lift_cases(mem, cases, addr, encoding)?;
    Ok(Value::Variant(cases[index].0.clone(), payload.map(Box::new)))
}

#[allow(clippy::too_many_arguments)]
pub fn lower_variant<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    cases: &[(String, Option<ValType>)],
    case_name: &str,
    payload: Option<&Value>,
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    lower_cases(mem, realloc, chain, cases, case_name, payload, addr, encoding)
}

pub fn lift_enum<M: LinearMemory>(mem: &M, cases: &[String], addr: u32) -> Result<Value> {
    let discriminant = read_discriminant(mem, addr, cases.len())?;
    let name = cases
        .get(discriminant as usize)
        .ok_or_else(|| Error::ill_formed_discriminant(discriminant, cases.len()))?;
    Ok(Value::Enum(name.clone()))
}

pub fn lower_enum<M: LinearMemory>(mem: &mut M, cases: &[String], name: &str, addr: u32) -> Result<()> {
    let index = cases
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| Error::type_mismatch(format!("unknown enum case `{name}`")))?;
    write_discriminant(mem, addr, cases.len(), index as u32)
}

fn option_cases(inner: &ValType) -> Vec<(String, Option<ValType>)> {
    vec![("none".to_string(), None), ("some".to_string(), Some(inner.clone()))]
}

pub fn lift_option<M: LinearMemory>(mem: &M, inner: &ValType, addr: u32, encoding: StringEncoding) -> Result<Value> {
    let cases = option_cases(inner);
    let (index, payload) = lift_cases(mem, &cases, addr, encoding)?;
    Ok(Value::Option(if index == 1 { payload.map(Box::new) } else { None }))
}

pub fn lower_option<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    inner: &ValType,
    value: Option<&Value>,
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    let cases = option_cases(inner);
    match value {
        None => lower_cases(mem, realloc, chain, &cases, "none", None, addr, encoding),
        Some(v) => lower_cases(mem, realloc, chain, &cases, "some", Some(v), addr, encoding),
    }
}

fn result_cases(ok: &Option<Box<ValType>>, err: &Option<Box<ValType>>) -> Vec<(String, Option<ValType>)> {
    vec![
        ("ok".to_string(), ok.as_deref().cloned()),
        ("err".to_string(), err.as_deref().cloned()),
    ]
}

pub fn lift_result<M: LinearMemory>(
    mem: &M,
    ok: &Option<Box<ValType>>,
    err: &Option<Box<ValType>>,
    addr: u32,
    encoding: StringEncoding,
) -> Result<Value> {
    let cases = result_cases(ok, err);
    let (index, payload) = lift_cases(mem, &cases, addr, encoding)?;
    Ok(Value::Result(if index == 0 {
        Ok(payload.map(Box::new))
    } else {
        Err(payload.map(Box::new))
    }))
}

#[allow(clippy::too_many_arguments)]
pub fn lower_result<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    ok: &Option<Box<ValType>>,
    err: &Option<Box<ValType>>,
    value: &core::result::Result<Option<Box<Value>>, Option<Box<Value>>>,
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    let cases = result_cases(ok, err);
    match value {
        Ok(payload) => lower_cases(mem, realloc, chain, &cases, "ok", payload.as_deref(), addr, encoding),
        Err(payload) => lower_cases(mem, realloc, chain, &cases, "err", payload.as_deref(), addr, encoding),
    }
}

pub fn lift_flags<M: LinearMemory>(mem: &M, names: &[String], addr: u32) -> Result<Value> {
    let byte_len = flags_byte_len(names.len());
    let bytes = memory::load_bytes(mem, addr, byte_len, byte_len.min(4).max(1))?;
    let mut set = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let byte = bytes[i / 8];
        if byte & (1 << (i % 8)) != 0 {
            set.push(name.clone());
        }
    }
    Ok(Value::Flags(set))
}

pub fn lower_flags<M: LinearMemory>(mem: &mut M, names: &[String], set: &[String], addr: u32) -> Result<()> {
    let byte_len = flags_byte_len(names.len());
    let mut bytes = vec![0u8; byte_len as usize];
    for name in set {
        let index = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::type_mismatch(format!("unknown flag `{name}`")))?;
        bytes[index / 8] |= 1 << (index % 8);
    }
    memory::store_bytes(mem, addr, &bytes, byte_len.min(4).max(1))
}
