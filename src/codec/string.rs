//! String codec.
//!
//! A string is represented in memory as an 8-byte header `(ptr: u32, len:
//! u32)` pointing at a separately allocated buffer of `len` code units
//! (UTF-8 bytes, or UTF-16LE code units depending on `encoding`). The header
//! itself is 4-byte aligned; the pointed-to data's alignment matches its
//! code unit width.

use crate::alloc::{Realloc, ReleaseChain};
use crate::error::{Error, Result};
use crate::memory::{self, LinearMemory};
use crate::types::StringEncoding;
use crate::value::Value;

pub fn lift<M: LinearMemory>(mem: &M, addr: u32, encoding: StringEncoding) -> Result<Value> {
    let ptr = memory::load_u32(mem, addr)?;
    let len = memory::load_u32(mem, addr + 4)?;
    match encoding {
        StringEncoding::Utf8 => {
            let bytes = memory::load_bytes(mem, ptr, len, 1)?;
            let s = String::from_utf8(bytes).map_err(|_| Error::ill_formed_utf8())?;
            Ok(Value::String(s))
        }
        StringEncoding::Utf16Le => {
            let byte_len = len.checked_mul(2).ok_or_else(|| Error::ill_formed_length(len, u32::MAX / 2))?;
            let bytes = memory::load_bytes(mem, ptr, byte_len, 2)?;
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            let s = String::from_utf16(&units).map_err(|_| Error::ill_formed_utf16())?;
            Ok(Value::String(s))
        }
    }
}

/// Encode `s` per `encoding`, returning `(bytes, code_unit_count, byte_align)`.
pub(crate) fn encode(s: &str, encoding: StringEncoding) -> (Vec<u8>, u32, u32) {
    match encoding {
        StringEncoding::Utf8 => {
            let bytes = s.as_bytes().to_vec();
            let len = bytes.len() as u32;
            (bytes, len, 1)
        }
        StringEncoding::Utf16Le => {
            let units: Vec<u16> = s.encode_utf16().collect();
            let len = units.len() as u32;
            let mut bytes = Vec::with_capacity(units.len() * 2);
            for u in &units {
                bytes.extend_from_slice(&u.to_le_bytes());
            }
            (bytes, len, 2)
        }
    }
}

/// Allocate storage for `bytes` (if non-empty) and write it, returning the
/// pointer (`0` for an empty string, matching the null-pointer convention
/// also used for empty lists).
pub(crate) fn allocate_and_write<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    bytes: &[u8],
    align: u32,
) -> Result<u32> {
    if bytes.is_empty() {
        return Ok(0);
    }
    let p = chain.allocate(realloc, bytes.len() as u32, align)?;
    memory::store_bytes(mem, p, bytes, align)?;
    Ok(p)
}

pub fn lower<M: LinearMemory, R: Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut ReleaseChain,
    s: &str,
    addr: u32,
    encoding: StringEncoding,
) -> Result<()> {
    let (bytes, code_unit_len, align) = encode(s, encoding);
    let ptr = allocate_and_write(mem, realloc, chain, &bytes, align)?;
    memory::store_u32(mem, addr, ptr)?;
    memory::store_u32(mem, addr + 4, code_unit_len)?;
    Ok(())
}
