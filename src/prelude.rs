//! Convenience re-export of the types most callers need.

pub use crate::alloc::{ReleaseChain, Realloc};
pub use crate::error::{Error, ErrorCategory, Result};
pub use crate::flatten::{FlatParams, FlatType, FlatValue, MAX_FLAT_PARAMS};
pub use crate::host::{AbiOptions, HostCall};
pub use crate::layout::{layout_of, Layout};
pub use crate::memory::{LinearMemory, VecMemory};
pub use crate::types::{StringEncoding, ValType};
pub use crate::value::Value;
pub use crate::{call, lift, lower, lower_param, lower_params};
