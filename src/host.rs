//! External interfaces the host must provide (§6.1 of the design): linear
//! memory plus a way to invoke guest exports. [`crate::memory::LinearMemory`]
//! covers the first; [`HostCall`] and [`AbiOptions`] cover the rest.

use crate::alloc::Realloc;
use crate::error::Result;
use crate::memory::LinearMemory;
use crate::types::StringEncoding;

/// A guest export the host can invoke by name, passing/receiving raw core
/// WebAssembly values (already flattened; this crate hands it `u64`-coded
/// [`crate::flatten::FlatValue`] bit patterns, never component-level
/// values).
pub trait HostCall {
    /// Invoke the export named `name` with the given flat argument values,
    /// returning its flat result values.
    fn call(&mut self, name: &str, args: &[u64]) -> Result<Vec<u64>>;

    /// Look up and invoke `cabi_post_<name>` if the guest exports it.
    /// Per the Canonical ABI, post-return cleanup is optional: a guest that
    /// doesn't need it simply has no such export, and this is not an error.
    fn call_post_return(&mut self, name: &str, args: &[u64]) -> Result<()>;
}

/// The configuration surface for a single call: which linear memory, guest
/// allocator, and call capability to use, and which string encoding the
/// guest's exports were compiled to expect.
pub struct AbiOptions<'a, M: LinearMemory, H: HostCall, R: Realloc> {
    pub memory: &'a mut M,
    pub call: &'a mut H,
    pub realloc: &'a mut R,
    pub string_encoding: StringEncoding,
}

impl<'a, M: LinearMemory, H: HostCall, R: Realloc> AbiOptions<'a, M, H, R> {
    pub fn new(memory: &'a mut M, call: &'a mut H, realloc: &'a mut R, string_encoding: StringEncoding) -> Self {
        Self { memory, call, realloc, string_encoding }
    }
}
