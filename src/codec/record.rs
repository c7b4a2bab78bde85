//! Record and tuple codec: fields laid out one after another per
//! [`crate::layout::field_offsets`], each field's own lift/lower delegated
//! back to [`super::lift`]/[`super::lower`].

use crate::alloc::{Realloc, ReleaseChain};
use crate::error::{Error, Result};
use crate::layout::field_offsets;
use crate::memory::LinearMemory;
use crate::types::{StringEncoding, ValType};
use crate::value::Value;

pub fn lift_record<M: LinearMemory>(
    mem: &M,
    fields: &[(String, ValType)],
    addr: u32,
    encoding: StringEncoding,
) -> Result<Value> {
    let offsets = field_offsets(fields.iter().map(|(_, t)| t));
    let mut values = Vec::with_capacity(fields.len());
    for ((name, ty), offset) in fields.iter().zip(offsets) {
        values.push((name.clone(), super::lift(mem, ty, addr + offset, encoding)?));
    }
    Ok(Value::Record(values))
}

pub fn lift_tuple<M: LinearMemory>(
    mem: &M,
    elems: &[ValType],
    addr: u32,
    encoding: StringEncoding,
) -> Result<Value> {
    let offsets = field_offsets(elems.iter());
    let mut values = Vec::with_capacity(elems.len());
    for (ty, offset) in elems.iter().zip(offsets) {
        values.push(super::lift(mem, ty, addr + offset, encoding)?);
    }
    Ok(Value::Tuple(values))
}

pub fn lower_record<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    fields: &[(String, ValType)],
    field_values: &[(String, Value)],
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    if fields.len() != field_values.len() {
        return Err(Error::type_mismatch("record field count mismatch"));
    }
    let offsets = field_offsets(fields.iter().map(|(_, t)| t));
    for (((decl_name, ty), (val_name, value)), offset) in
        fields.iter().zip(field_values.iter()).zip(offsets)
    {
        if decl_name != val_name {
            return Err(Error::type_mismatch(format!(
                "expected field `{decl_name}`, got `{val_name}`"
            )));
        }
        super::lower(mem, realloc, chain, ty, value, addr + offset, encoding)?;
    }
    Ok(())
}

pub fn lower_tuple<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    elems: &[ValType],
    items: &[Value],
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    if elems.len() != items.len() {
        return Err(Error::type_mismatch("tuple arity mismatch"));
    }
    let offsets = field_offsets(elems.iter());
    for ((ty, value), offset) in elems.iter().zip(items.iter()).zip(offsets) {
        super::lower(mem, realloc, chain, ty, value, addr + offset, encoding)?;
    }
    Ok(())
}
