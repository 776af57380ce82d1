//! Retry configuration for bounded SeqLock reads.

use crate::error::SyncError;

/// Default number of read attempts before a bounded read gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1024;

/// Default wait between attempts.
pub const DEFAULT_BACKOFF: BackoffStyle = BackoffStyle::Snooze;

/// How a reader waits between two failed read attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffStyle {
    /// Busy-wait with exponentially growing spin loops. Never yields, so it
    /// is the only choice on a real-time thread.
    Spin,
    /// Spin first, then yield the time slice to the scheduler.
    Snooze,
}

/// Bounds a reader's wait for a consistent value.
///
/// Used by [`SeqLock::load_bounded`](crate::SeqLock::load_bounded), for
/// callers that must not wait indefinitely on a stuck or misbehaving writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Read attempts before giving up. Must be at least 1. Default: 1024.
    pub max_attempts: u32,
    /// Wait strategy between attempts. Default: [`BackoffStyle::Snooze`].
    pub backoff: BackoffStyle,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy for real-time threads: spin only, `max_attempts` tries.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRetryPolicy`] if `max_attempts` is zero.
    pub fn realtime(max_attempts: u32) -> Result<Self, SyncError> {
        let policy = Self {
            max_attempts,
            backoff: BackoffStyle::Spin,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRetryPolicy`] if `max_attempts` is zero.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.max_attempts == 0 {
            return Err(SyncError::InvalidRetryPolicy {
                reason: "max_attempts must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.backoff, BackoffStyle::Snooze);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = RetryPolicy::realtime(0).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRetryPolicy { .. }));

        let literal = RetryPolicy {
            max_attempts: 0,
            backoff: BackoffStyle::Snooze,
        };
        assert!(literal.validate().is_err());
    }

    #[test]
    fn realtime_policy_spins() {
        let policy = RetryPolicy::realtime(16).unwrap();
        assert_eq!(policy.backoff, BackoffStyle::Spin);
        assert_eq!(policy.max_attempts, 16);
    }
}
