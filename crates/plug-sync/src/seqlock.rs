//! Single-writer, multi-reader sequence lock.
//!
//! # Protocol
//!
//! The sequence counter is even while the value is stable and odd while a
//! write is in progress.
//!
//! ```text
//! store(v):   s = seq            (relaxed)
//!             seq = s + 1        (relaxed)   -- odd: readers back off
//!             fence(Release)
//!             bytes <- v         (per-byte relaxed atomic stores)
//!             seq = s + 2        (release)   -- even again
//!
//! try_load(): s1 = seq           (acquire)   -- odd: fail
//!             out <- bytes       (per-byte relaxed atomic loads)
//!             fence(Acquire)
//!             s2 = seq           (relaxed)   -- s1 != s2: fail
//! ```
//!
//! `store` is wait-free. `try_load` never blocks and reports an overlapping
//! write as `None`; [`SeqLock::load`] retries until it succeeds.
//!
//! # Writers
//!
//! Only one thread may store at a time. Concurrent stores can interleave
//! their counter updates, after which readers may observe a mix of two
//! values. Because `T: Pod`, such a value is still a valid `T` (garbage,
//! never undefined behaviour); keeping a single writer is the caller's job.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{fence, AtomicU8, AtomicUsize, Ordering};

use bytemuck::{Pod, Zeroable};
use crossbeam_utils::Backoff;

use crate::config::{BackoffStyle, RetryPolicy};
use crate::error::SyncError;

/// A value shared between one writer and any number of readers without
/// locking.
///
/// `T` must be [`Pod`]: plain bytes with no padding and no drop glue, so a
/// byte-wise copy is always a valid value. Anything else is rejected at
/// compile time:
///
/// ```compile_fail
/// use plug_sync::SeqLock;
///
/// let lock = SeqLock::new(String::from("owned heap data"));
/// ```
///
/// ```
/// use plug_sync::SeqLock;
///
/// let lock = SeqLock::new([0.0f32; 2]);
/// lock.store([0.5, -0.5]);
/// assert_eq!(lock.load(), [0.5, -0.5]);
/// assert_eq!(lock.sequence(), 4);
/// ```
pub struct SeqLock<T: Pod> {
    seq: AtomicUsize,
    data: UnsafeCell<T>,
}

// SAFETY: every shared access to `data` goes through per-byte atomics, and
// readers only hand out values that passed the sequence check. `T: Pod`
// makes any byte pattern a valid `T`.
unsafe impl<T: Pod + Send> Sync for SeqLock<T> {}

impl<T: Pod> SeqLock<T> {
    /// Sequence of a freshly constructed lock.
    pub const INITIAL_SEQUENCE: usize = 2;

    /// Create a lock holding `value`.
    ///
    /// The counter starts at [`INITIAL_SEQUENCE`](Self::INITIAL_SEQUENCE),
    /// as if `value` had been published by one `store`.
    pub const fn new(value: T) -> Self {
        Self {
            seq: AtomicUsize::new(Self::INITIAL_SEQUENCE),
            data: UnsafeCell::new(value),
        }
    }

    /// Publish `value`. Wait-free; must not race with another `store`.
    pub fn store(&self, value: T) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        let dst = self.data.get().cast::<u8>();
        for (offset, &byte) in bytemuck::bytes_of(&value).iter().enumerate() {
            // SAFETY: `offset < size_of::<T>()`; every concurrent access to
            // these bytes is atomic.
            unsafe { AtomicU8::from_ptr(dst.add(offset)) }.store(byte, Ordering::Relaxed);
        }

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Read the value if no write overlapped the read.
    ///
    /// Returns `None` when a write was in progress or completed during the
    /// copy. Never blocks.
    pub fn try_load(&self) -> Option<T> {
        let before = self.seq.load(Ordering::Acquire);
        if before & 1 == 1 {
            return None;
        }

        let mut out = T::zeroed();
        let src = self.data.get().cast::<u8>();
        for (offset, byte) in bytemuck::bytes_of_mut(&mut out).iter_mut().enumerate() {
            // SAFETY: as in `store`.
            *byte = unsafe { AtomicU8::from_ptr(src.add(offset)) }.load(Ordering::Relaxed);
        }

        fence(Ordering::Acquire);
        let after = self.seq.load(Ordering::Relaxed);
        (before == after).then_some(out)
    }

    /// Read the value, retrying until no write overlaps the read.
    ///
    /// Lock-free: a reader only retries because the writer made progress.
    pub fn load(&self) -> T {
        let backoff = Backoff::new();
        loop {
            if let Some(value) = self.try_load() {
                return value;
            }
            backoff.snooze();
        }
    }

    /// Read the value, giving up after `policy.max_attempts` attempts.
    ///
    /// # Errors
    ///
    /// - [`SyncError::InvalidRetryPolicy`] if `policy` fails validation.
    ///   No read is attempted.
    /// - [`SyncError::Contended`] if every attempt overlapped a write.
    pub fn load_bounded(&self, policy: &RetryPolicy) -> Result<T, SyncError> {
        policy.validate()?;
        let backoff = Backoff::new();
        for _ in 0..policy.max_attempts {
            if let Some(value) = self.try_load() {
                return Ok(value);
            }
            match policy.backoff {
                BackoffStyle::Spin => backoff.spin(),
                BackoffStyle::Snooze => backoff.snooze(),
            }
        }
        log::warn!(
            "seqlock read gave up after {} attempts at sequence {}",
            policy.max_attempts,
            self.sequence()
        );
        Err(SyncError::Contended {
            attempts: policy.max_attempts,
        })
    }

    /// Store `f(current)` and return the stored value.
    ///
    /// The read and the write are not one atomic step; this is only
    /// meaningful from the single writer thread.
    pub fn update<F: FnOnce(T) -> T>(&self, f: F) -> T {
        let next = f(self.load());
        self.store(next);
        next
    }

    /// Current sequence counter. Even when stable; starts at
    /// [`INITIAL_SEQUENCE`](Self::INITIAL_SEQUENCE) and advances by two per
    /// store.
    pub fn sequence(&self) -> usize {
        self.seq.load(Ordering::Acquire)
    }

    /// Direct access to the value. The exclusive borrow rules out readers.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consume the lock and return the value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Pod> Default for SeqLock<T> {
    fn default() -> Self {
        Self::new(T::zeroed())
    }
}

impl<T: Pod> From<T> for SeqLock<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for SeqLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("SeqLock");
        out.field("sequence", &self.sequence());
        match self.try_load() {
            Some(value) => out.field("value", &value),
            None => out.field("value", &format_args!("<write in progress>")),
        };
        out.finish()
    }
}
