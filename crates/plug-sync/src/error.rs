//! Error types for the synchronisation primitives.

use std::error::Error;
use std::fmt;

/// Errors surfaced by bounded reads and retry configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    /// A bounded read gave up because every attempt overlapped a write.
    Contended {
        /// Number of read attempts made.
        attempts: u32,
    },
    /// A [`RetryPolicy`](crate::RetryPolicy) failed validation.
    InvalidRetryPolicy {
        /// Which invariant was violated.
        reason: String,
    },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contended { attempts } => {
                write!(f, "seqlock read still contended after {attempts} attempts")
            }
            Self::InvalidRetryPolicy { reason } => write!(f, "invalid retry policy: {reason}"),
        }
    }
}

impl Error for SyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_attempts() {
        let err = SyncError::Contended { attempts: 8 };
        assert_eq!(err.to_string(), "seqlock read still contended after 8 attempts");
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn Error> = Box::new(SyncError::InvalidRetryPolicy {
            reason: "zero attempts".into(),
        });
        assert!(err.to_string().contains("zero attempts"));
    }
}
