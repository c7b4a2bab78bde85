//! Error types for canonical ABI marshalling.
//!
//! Mirrors the categorized, coded error design used across the `wrt-*`
//! crates: a small [`ErrorCategory`] discriminates the broad failure class,
//! a numeric code identifies the specific condition within that category,
//! and a human-readable message carries the details. Constructors are named
//! after the condition they report rather than exposed as a bare struct
//! literal.

use core::fmt;

/// Broad classification of a failure, used for quick triage by callers that
/// want to branch on category without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Access outside the bounds of linear memory.
    OutOfBounds,
    /// Access at an address that violates the required alignment.
    Unaligned,
    /// Bytes in memory do not encode a valid value of the expected type.
    IllFormed,
    /// The requested operation does not apply to the given type.
    TypeMismatch,
    /// `cabi_realloc` failed or returned an unusable pointer.
    AllocationFailed,
    /// A guest-provided callback (`realloc`, a host call) returned an error.
    HostError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::OutOfBounds => "out of bounds",
            ErrorCategory::Unaligned => "unaligned",
            ErrorCategory::IllFormed => "ill-formed",
            ErrorCategory::TypeMismatch => "type mismatch",
            ErrorCategory::AllocationFailed => "allocation failed",
            ErrorCategory::HostError => "host error",
        };
        f.write_str(s)
    }
}

/// An error produced while computing a layout, reading/writing memory, or
/// flattening parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    category: ErrorCategory,
    code: u32,
    message: String,
}

impl Error {
    fn new(category: ErrorCategory, code: u32, message: impl Into<String>) -> Self {
        Self { category, code, message: message.into() }
    }

    /// Broad failure classification.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// Category-local numeric code.
    pub fn code(&self) -> u32 {
        self.code
    }

    /// Human-readable detail string.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn out_of_bounds(addr: u32, len: u32, memory_size: u32) -> Self {
        Self::new(
            ErrorCategory::OutOfBounds,
            1,
            format!(
                "access at {addr:#x} of length {len} exceeds memory size {memory_size:#x}"
            ),
        )
    }

    pub fn unaligned(addr: u32, align: u32) -> Self {
        Self::new(
            ErrorCategory::Unaligned,
            1,
            format!("address {addr:#x} is not aligned to {align}"),
        )
    }

    pub fn ill_formed_bool(byte: u8) -> Self {
        Self::new(ErrorCategory::IllFormed, 1, format!("invalid bool byte {byte:#x}"))
    }

    pub fn ill_formed_char(code_point: u32) -> Self {
        Self::new(
            ErrorCategory::IllFormed,
            2,
            format!("{code_point:#x} is not a valid unicode scalar value"),
        )
    }

    pub fn ill_formed_utf8() -> Self {
        Self::new(ErrorCategory::IllFormed, 3, "string bytes are not valid UTF-8")
    }

    pub fn ill_formed_utf16() -> Self {
        Self::new(ErrorCategory::IllFormed, 4, "string code units are not valid UTF-16")
    }

    pub fn ill_formed_discriminant(discriminant: u32, case_count: usize) -> Self {
        Self::new(
            ErrorCategory::IllFormed,
            5,
            format!("discriminant {discriminant} is out of range for {case_count} case(s)"),
        )
    }

    pub fn ill_formed_length(len: u32, max: u32) -> Self {
        Self::new(
            ErrorCategory::IllFormed,
            6,
            format!("length {len} exceeds maximum {max}"),
        )
    }

    pub fn type_mismatch(what: impl Into<String>) -> Self {
        Self::new(ErrorCategory::TypeMismatch, 1, what.into())
    }

    pub fn allocation_failed(size: u32, align: u32) -> Self {
        Self::new(
            ErrorCategory::AllocationFailed,
            1,
            format!("cabi_realloc failed to allocate {size} byte(s) aligned to {align}"),
        )
    }

    pub fn host_error(what: impl Into<String>) -> Self {
        Self::new(ErrorCategory::HostError, 1, what.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

impl std::error::Error for Error {}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
