//! Host-side marshalling engine for the WebAssembly Component Model's
//! Canonical ABI.
//!
//! Given a description of a guest's linear memory and its `cabi_realloc`/
//! `cabi_post_<name>` entry points, this crate computes layout, lifts
//! values out of memory, lowers values into memory or a flat parameter
//! list, and drives the full lower/invoke/lift/post-return/release
//! sequence for a call. It does not execute WebAssembly itself, parse
//! component binaries, or generate bindings; see [`crate::host`] for the
//! capabilities a caller must supply.

#![deny(unsafe_code)]
#![warn(clippy::missing_panics_doc)]

pub mod alloc;
pub mod call;
pub mod codec;
pub mod error;
pub mod flatten;
pub mod host;
pub mod layout;
pub mod memory;
pub mod prelude;
pub mod types;
pub mod value;

pub use call::call;
pub use codec::{lift, lower};
pub use error::{Error, ErrorCategory, Result};
pub use flatten::{lower_params, FlatParams, FlatType, FlatValue, MAX_FLAT_PARAMS};
pub use host::{AbiOptions, HostCall};
pub use layout::{layout_of, Layout};
pub use memory::LinearMemory;
pub use types::{StringEncoding, ValType};
pub use value::Value;

/// Lower a single parameter, for callers that only ever need one value and
/// don't want to build a one-element slice just to call [`lower_params`].
pub fn lower_param<M: memory::LinearMemory, R: alloc::Realloc>(
    mem: &mut M,
    realloc: &mut R,
    chain: &mut alloc::ReleaseChain,
    ty: &ValType,
    value: &Value,
    encoding: StringEncoding,
) -> Result<FlatParams> {
    lower_params(mem, realloc, chain, std::slice::from_ref(ty), std::slice::from_ref(value), encoding)
}
