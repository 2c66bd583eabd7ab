//! Error taxonomy shared by every collection in the crate.
//!
//! All failures are local precondition or state failures. Nothing here is
//! transient and nothing is retried: an operation that returns `Err` has left
//! the collection exactly as it found it.

use thiserror::Error;

/// Errors returned by list, view and cursor operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // === Argument errors ===
    /// An index was outside the addressed sequence.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A `(start, count)` range did not fit the addressed sequence.
    #[error("range {start}+{count} out of bounds for length {len}")]
    RangeOutOfBounds { start: usize, count: usize, len: usize },

    /// The addressed sequence holds no items.
    #[error("sequence is empty")]
    Empty,

    /// Growing the store would pass the configured hard cap.
    #[error("capacity exceeded: {requested} items requested, maximum is {max}")]
    CapacityExceeded { requested: usize, max: usize },

    /// A hashed list already holds an item equal to the one supplied.
    #[error("duplicate item not allowed in a hashed list")]
    Duplicate,

    /// A `Config` value was rejected by `Config::validate`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    // === State errors ===
    /// The view was invalidated by a structural change of its list.
    #[error("view was invalidated by a structural change")]
    Invalidated,

    /// The view was disposed, or the handle belongs to a recycled slot.
    #[error("view has been disposed")]
    Disposed,

    // === Traversal errors ===
    /// The list changed since the cursor was created.
    #[error("list modified during traversal (version {expected}, now {found})")]
    ConcurrentModification { expected: u64, found: u64 },

    // === Capability errors ===
    /// The operation is not defined for this variant or comparer.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A bad index, count, item or configuration value.
    Argument,
    /// The addressed view is no longer live.
    InvalidState,
    /// A detached traversal observed a structural change.
    ConcurrentModification,
    /// The variant does not implement the operation.
    NotSupported,
}

impl Error {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        return match self {
            Error::IndexOutOfRange { .. }
            | Error::RangeOutOfBounds { .. }
            | Error::Empty
            | Error::CapacityExceeded { .. }
            | Error::Duplicate
            | Error::InvalidConfig(_) => ErrorKind::Argument,
            Error::Invalidated | Error::Disposed => ErrorKind::InvalidState,
            Error::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Error::NotSupported(_) => ErrorKind::NotSupported,
        };
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Checks that `index` addresses an existing item of a sequence of `len`.
#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    return Ok(());
}

/// Checks that `index` is a valid insertion point (`0..=len`).
#[inline]
pub(crate) fn check_position(index: usize, len: usize) -> Result<()> {
    if index > len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    return Ok(());
}

/// Checks that `start..start + count` lies inside `0..len`.
#[inline]
pub(crate) fn check_range(start: usize, count: usize, len: usize) -> Result<()> {
    match start.checked_add(count) {
        Some(end) if end <= len => return Ok(()),
        _ => return Err(Error::RangeOutOfBounds { start, count, len }),
    }
}
