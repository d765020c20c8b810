//! # Error Types
//!
//! Errors for the fallible edges of the crate.
//!
//! The formatter engine itself never fails: unresolvable layouts, missing
//! fields and unreadable pointers all degrade to empty views (see
//! [`crate::layout`]). The errors below cover the surfaces around it, where a
//! caller can act on a failure: parsing configuration and type patterns, and
//! reading from an in-memory [`Snapshot`](crate::snapshot::Snapshot).
//!
//! We use `thiserror` to derive `Error` and the display messages.

use thiserror::Error;

/// Main error type for vmview operations
///
/// ## Error Categories
///
/// 1. **Registration errors**: InvalidPattern, UnknownFamily
/// 2. **Configuration errors**: InvalidConfig
/// 3. **Snapshot errors**: MemoryRead, UnknownType
#[derive(Error, Debug)]
pub enum VmViewError
{
    /// A host-form type pattern could not be parsed
    ///
    /// Patterns must be anchored (`^`) and end with either `<` (a generic
    /// family) or `$` (an exact, non-generic type name).
    #[error("Invalid type pattern: {0}")]
    InvalidPattern(String),

    /// A container family name was not recognised
    #[error("Unknown container family: {0}")]
    UnknownFamily(String),

    /// A configuration value was rejected
    ///
    /// `key` names the setting (usually the environment variable) and `value`
    /// is the rejected input.
    #[error("Invalid configuration value for {key}: {value:?}")]
    InvalidConfig
    {
        /// Setting that failed validation
        key: String,
        /// Rejected value
        value: String,
    },

    /// A snapshot read touched memory outside every mapped segment
    #[error("Memory read failed at 0x{address:016x} (size: {size})")]
    MemoryRead
    {
        /// First byte of the failed read
        address: u64,
        /// Number of bytes requested
        size: u64,
    },

    /// A snapshot type lookup by name found nothing
    #[error("Unknown type: {0}")]
    UnknownType(String),
}

/// Convenience type alias for `Result<T, VmViewError>`
///
/// ```rust
/// use vmview_core::error::VmViewResult;
/// fn foo() -> VmViewResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type VmViewResult<T> = std::result::Result<T, VmViewError>;
