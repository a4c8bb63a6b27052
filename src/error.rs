//! Error type shared by every container in the crate.
//!
//! Most container methods come in two flavours: a `try_*` form that returns
//! [`Result`], and a plain form that treats failure as fatal (allocation
//! failure aborts through [`std::alloc::handle_alloc_error`], everything else
//! panics with the error message).

use core::alloc::Layout;
use thiserror::Error;

/// Failures surfaced by storage and container operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The allocator refused a request.
    #[error("memory allocation failed: requested {size} bytes (align {align})")]
    AllocFailed {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment.
        align: usize,
    },

    /// A size computation overflowed, or the index space of a container is used up.
    #[error("capacity overflow: requested {requested} elements")]
    CapacityOverflow {
        /// The element count that could not be represented.
        requested: usize,
    },

    /// A fixed-capacity container was asked to hold more than it can.
    #[error("fixed capacity of {capacity} elements exhausted")]
    CapacityExhausted {
        /// The compile-time capacity.
        capacity: usize,
    },

    /// Checked lookup (`at`) on a key that is not present.
    #[error("key not found")]
    KeyNotFound,
}

impl CollectionError {
    /// Builds an [`AllocFailed`](CollectionError::AllocFailed) error for `layout`.
    pub fn alloc_failed(layout: Layout) -> Self {
        Self::AllocFailed {
            size: layout.size(),
            align: layout.align(),
        }
    }

    /// Builds a [`CapacityOverflow`](CollectionError::CapacityOverflow) error.
    pub fn capacity_overflow(requested: usize) -> Self {
        Self::CapacityOverflow { requested }
    }

    /// Builds a [`CapacityExhausted`](CollectionError::CapacityExhausted) error.
    pub fn capacity_exhausted(capacity: usize) -> Self {
        Self::CapacityExhausted { capacity }
    }

    /// Returns `true` if the allocator itself failed.
    pub fn is_alloc_failure(&self) -> bool {
        matches!(self, Self::AllocFailed { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CollectionError>;

/// Unwraps the result of a fallible operation for the infallible API surface.
///
/// Allocation failures go through `handle_alloc_error`; precondition failures
/// (capacity exhausted, overflow) panic.
#[track_caller]
pub(crate) fn infallible<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(CollectionError::AllocFailed { size, align }) => {
            match Layout::from_size_align(size, align) {
                Ok(layout) => std::alloc::handle_alloc_error(layout),
                Err(_) => panic!("memory allocation failed: requested {size} bytes"),
            }
        }
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CollectionError::alloc_failed(Layout::new::<u64>());
        assert_eq!(
            err.to_string(),
            "memory allocation failed: requested 8 bytes (align 8)"
        );
        assert!(err.is_alloc_failure());
        assert_eq!(
            CollectionError::capacity_exhausted(5).to_string(),
            "fixed capacity of 5 elements exhausted"
        );
        assert_eq!(CollectionError::KeyNotFound.to_string(), "key not found");
        assert!(!CollectionError::capacity_overflow(usize::MAX).is_alloc_failure());
    }

    #[test]
    fn test_infallible_passes_values_through() {
        assert_eq!(infallible(Ok(7)), 7);
    }

    #[test]
    #[should_panic(expected = "fixed capacity of 3 elements exhausted")]
    fn test_infallible_panics_on_precondition() {
        infallible::<()>(Err(CollectionError::capacity_exhausted(3)));
    }
}
