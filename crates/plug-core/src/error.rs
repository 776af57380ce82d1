//! Error types for container growth and allocation.
//!
//! Growth failures are fatal by default: the panicking container APIs
//! format one of these errors into their panic message. The `try_*`
//! variants hand the same value back to the caller instead.

use std::error::Error;
use std::fmt;

/// Errors raised when a container cannot provide the requested capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CapacityError {
    /// The requested capacity does not fit in the container's size type.
    SizeOverflow {
        /// Number of elements requested.
        requested: usize,
        /// Largest element count the size type can represent.
        max: usize,
    },
    /// The container is already at the largest capacity its size type
    /// allows and cannot grow by even one element.
    AtMaximumCapacity {
        /// Largest element count the size type can represent.
        max: usize,
    },
    /// The global allocator returned null, even after retrying a
    /// zero-byte request as a one-byte request.
    AllocationFailed {
        /// Size of the failed request in bytes.
        bytes: usize,
    },
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeOverflow { requested, max } => {
                write!(
                    f,
                    "unable to grow: requested capacity ({requested}) is larger than maximum value for size type ({max})"
                )
            }
            Self::AtMaximumCapacity { max } => {
                write!(f, "capacity unable to grow: already at maximum size {max}")
            }
            Self::AllocationFailed { bytes } => {
                write!(f, "allocation of {bytes} bytes failed")
            }
        }
    }
}

impl Error for CapacityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_both_sizes_on_overflow() {
        let err = CapacityError::SizeOverflow {
            requested: 10,
            max: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("(10)"));
        assert!(msg.contains("(7)"));
    }

    #[test]
    fn display_at_maximum() {
        let err = CapacityError::AtMaximumCapacity { max: 255 };
        assert_eq!(
            err.to_string(),
            "capacity unable to grow: already at maximum size 255"
        );
    }

    #[test]
    fn is_std_error() {
        fn takes_error(_: &dyn Error) {}
        takes_error(&CapacityError::AllocationFailed { bytes: 64 });
    }
}
