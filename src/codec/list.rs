//! List codec: unbounded lists (`ptr`/`len` header, like a string) and
//! fixed-length lists (inline, element after element, no header at all).

use crate::alloc::{Realloc, ReleaseChain};
use crate::error::{Error, Result};
use crate::layout::layout_of;
use crate::memory::{self, LinearMemory};
use crate::types::{StringEncoding, ValType};
use crate::value::Value;

pub fn lift<M: LinearMemory>(
    mem: &M,
    element: &ValType,
    len: Option<u32>,
    addr: u32,
    encoding: StringEncoding,
) -> Result<Value> {
    let elem_layout = layout_of(element);
    match len {
        None => {
            let ptr = memory::load_u32(mem, addr)?;
            let count = memory::load_u32(mem, addr + 4)?;
            let mut items = Vec::with_capacity(count as usize);
            let stride = elem_layout.padded_size();
            for i in 0..count {
                let item_addr = ptr
                    .checked_add(i.checked_mul(stride).ok_or_else(|| Error::ill_formed_length(count, u32::MAX))?)
                    .ok_or_else(|| Error::ill_formed_length(count, u32::MAX))?;
                items.push(super::lift(mem, element, item_addr, encoding)?);
            }
            Ok(Value::List(items))
        }
        Some(count) => {
            let mut items = Vec::with_capacity(count as usize);
            let stride = elem_layout.padded_size();
            for i in 0..count {
                items.push(super::lift(mem, element, addr + i * stride, encoding)?);
            }
            Ok(Value::List(items))
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn lower<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    element: &ValType,
    len: Option<u32>,
    items: &[Value],
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    let elem_layout = layout_of(element);
    let stride = elem_layout.padded_size();

    if let Some(fixed_len) = len {
        if items.len() as u32 != fixed_len {
            return Err(Error::type_mismatch(format!(
                "fixed-length list expects {fixed_len} elements, got {}",
                items.len()
            )));
        }
        for (i, item) in items.iter().enumerate() {
            super::lower(mem, realloc, chain, element, item, addr + i as u32 * stride, encoding)?;
        }
        return Ok(());
    }

    let (data_ptr, count) = write_unbounded(mem, realloc, chain, element, items, encoding)?;
    memory::store_u32(mem, addr, data_ptr)?;
    memory::store_u32(mem, addr + 4, count)?;
    Ok(())
}

/// Allocate backing storage for an unbounded list and write its elements,
/// returning `(data_ptr, element_count)` without writing a header anywhere;
/// used both by [`lower`] (which writes the header into memory) and by the
/// parameter flattener (which returns the pair as two flat core values
/// instead).
pub(crate) fn write_unbounded<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    element: &ValType,
    items: &[Value],
    encoding: StringEncoding,
) -> Result<(u32, u32)> {
    let elem_layout = layout_of(element);
    let stride = elem_layout.padded_size();
    let total = stride
        .checked_mul(items.len() as u32)
        .ok_or_else(|| Error::ill_formed_length(items.len() as u32, u32::MAX))?;
    let data_ptr = if total == 0 {
        0
    } else {
        chain.allocate(realloc, total, elem_layout.align.max(1))?
    };
    for (i, item) in items.iter().enumerate() {
        super::lower(mem, realloc, chain, element, item, data_ptr + i as u32 * stride, encoding)?;
    }
    Ok((data_ptr, items.len() as u32))
}
