//! Error taxonomy shared by every fallible map operation.

use thiserror::Error;

/// Why a map operation failed. A failed operation never leaves the map in a
/// partially updated state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MapError {
    /// A required argument (hash or equality function) was never supplied.
    #[error("required argument missing: {0}")]
    NullArgument(&'static str),
    /// A configuration value is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
    /// The allocator refused the bucket array, or the entry arena is full.
    #[error("allocation failure")]
    AllocationFailure,
    /// Computing the size of a new bucket array overflowed.
    #[error("arithmetic overflow while sizing the bucket array")]
    ArithmeticOverflow,
    /// The operation is not allowed in the map's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
}

pub type Result<T> = core::result::Result<T, MapError>;
