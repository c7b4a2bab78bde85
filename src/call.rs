//! Call orchestration: the full `lower -> invoke -> lift -> post-return ->
//! release` sequence for a single guest export, tying together the
//! allocation broker, the composite codec, and the parameter flattener.

use crate::alloc::ReleaseChain;
use crate::codec;
use crate::error::{Error, Result};
use crate::flatten::{self, FlatParams, FlatValue, MAX_FLAT_PARAMS};
use crate::host::{AbiOptions, HostCall};
use crate::layout::{field_offsets, layout_of};
use crate::memory::LinearMemory;
use crate::types::ValType;
use crate::value::Value;
use crate::alloc::Realloc;

/// Does a result list need a return-pointer, or can it ride back on the
/// core value stack? Mirrors the parameter side's `MAX_FLAT_PARAMS` split:
/// more than one result, or any single aggregate result, is written through
/// memory instead.
fn results_need_retptr(result_types: &[ValType]) -> bool {
    match result_types {
        [] => false,
        [single] => !single.is_primitive(),
        _ => true,
    }
}

fn unflatten_primitive(ty: &ValType, bits: u64) -> Result<Value> {
    Ok(match ty {
        ValType::Bool => Value::Bool(bits != 0),
        ValType::S8 => Value::S8(bits as i8),
        ValType::U8 => Value::U8(bits as u8),
        ValType::S16 => Value::S16(bits as i16),
        ValType::U16 => Value::U16(bits as u16),
        ValType::S32 => Value::S32(bits as i32),
        ValType::U32 => Value::U32(bits as u32),
        ValType::S64 => Value::S64(bits as i64),
        ValType::U64 => Value::U64(bits),
        ValType::F32 => Value::F32(f32::from_bits(bits as u32)),
        ValType::F64 => Value::F64(f64::from_bits(bits)),
        ValType::Char => {
            char::from_u32(bits as u32).map(Value::Char).ok_or_else(|| Error::ill_formed_char(bits as u32))?
        }
        other => return Err(Error::type_mismatch(format!("{other:?} is not a stack-flat result type"))),
    })
}

fn flat_value_to_raw(v: &FlatValue) -> u64 {
    v.bits
}

/// Call the guest export `name`, lowering `values` against `param_types`
/// and lifting the guest's response against `result_types`.
///
/// Log levels: `trace!` for the slot-count/spill decision, `debug!` for the
/// invocation itself, matching how heavily-used internal boundaries are
/// instrumented elsewhere in this crate.
pub fn call<M: LinearMemory, H: HostCall, R: Realloc>(
    opts: &mut AbiOptions<'_, M, H, R>,
    name: &str,
    param_types: &[ValType],
    values: &[Value],
    result_types: &[ValType],
) -> Result<Vec<Value>> {
    let mut chain = ReleaseChain::new();
    match call_inner(opts, &mut chain, name, param_types, values, result_types) {
        Ok(results) => {
            chain.unwind(opts.realloc);
            log::trace!("call to `{name}` succeeded, released {name}'s host-side allocations");
            Ok(results)
        }
        Err(e) => {
            chain.unwind(opts.realloc);
            log::debug!("call to `{name}` failed, released in-flight allocations: {e}");
            Err(e)
        }
    }
}

fn call_inner<M: LinearMemory, H: HostCall, R: Realloc>(
    opts: &mut AbiOptions<'_, M, H, R>,
    chain: &mut ReleaseChain,
    name: &str,
    param_types: &[ValType],
    values: &[Value],
    result_types: &[ValType],
) -> Result<Vec<Value>> {
    let needs_retptr = results_need_retptr(result_types);
    let result_tuple_ty = ValType::Tuple(result_types.to_vec());
    let retptr = if needs_retptr {
        let l = layout_of(&result_tuple_ty);
        Some(if l.size == 0 { 0 } else { chain.allocate(opts.realloc, l.size, l.align.max(1))? })
    } else {
        None
    };

    let flat_params =
        flatten::lower_params(opts.memory, opts.realloc, chain, param_types, values, opts.string_encoding)?;

    let total_slots: usize = param_types.iter().map(|t| flatten::flat_types(t).len()).sum();
    log::trace!(
        "call `{name}`: {total_slots} flat slot(s) (limit {MAX_FLAT_PARAMS}), retptr={needs_retptr}"
    );

    let mut args: Vec<u64> = Vec::new();
    if let Some(ptr) = retptr {
        args.push(ptr as u64);
    }
    match &flat_params {
        FlatParams::Flat(vals) => args.extend(vals.iter().map(flat_value_to_raw)),
        FlatParams::Indirect(ptr) => args.push(*ptr as u64),
    }

    log::debug!("invoking guest export `{name}` with {} argument word(s)", args.len());
    let raw_results = opts.call.call(name, &args)?;

    let results = if needs_retptr {
        let ptr = retptr.expect("retptr was allocated above");
        let offsets = field_offsets(result_types.iter());
        let mut out = Vec::with_capacity(result_types.len());
        for (ty, offset) in result_types.iter().zip(offsets) {
            out.push(codec::lift(opts.memory, ty, ptr + offset, opts.string_encoding)?);
        }
        out
    } else {
        let mut out = Vec::with_capacity(result_types.len());
        for (ty, bits) in result_types.iter().zip(raw_results.iter()) {
            out.push(unflatten_primitive(ty, *bits)?);
        }
        out
    };

    let raw_return: Vec<u64> = if needs_retptr {
        vec![retptr.expect("retptr was allocated above") as u64]
    } else {
        raw_results.clone()
    };
    opts.call.call_post_return(name, &raw_return)?;
    Ok(results)
}
