//! Test fixtures shared by the plugdata container crates.
//!
//! - [`DropCounter`] / [`Tracked`]: values that count their own drops,
//!   for leak and double-drop checks.
//! - [`fixtures`]: element types for container scenarios ([`Widget`],
//!   the copyable/boxed [`Element`] pair, the torn-read detector
//!   [`Stamp`]).
//! - [`init_logging`]: route `log` output through `env_logger` in tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{Boxed, Element, Stamp, Widget};

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Install a test logger once per process. Safe to call from every test.
///
/// Honours `RUST_LOG`, e.g. `RUST_LOG=plug_array=trace`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Default)]
struct Counts {
    created: AtomicUsize,
    dropped: AtomicUsize,
}

/// Shared tally of [`Tracked`] values created and dropped.
#[derive(Clone, Default)]
pub struct DropCounter {
    counts: Arc<Counts>,
}

impl DropCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a value that reports to this counter.
    pub fn track(&self, value: i32) -> Tracked {
        self.counts.created.fetch_add(1, Ordering::Relaxed);
        Tracked {
            value,
            counter: self.clone(),
        }
    }

    pub fn created(&self) -> usize {
        self.counts.created.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> usize {
        self.counts.dropped.load(Ordering::Relaxed)
    }

    /// Values created but not yet dropped.
    ///
    /// # Panics
    ///
    /// Panics if more values were dropped than created (a double drop).
    pub fn live(&self) -> usize {
        let created = self.created();
        let dropped = self.dropped();
        assert!(
            dropped <= created,
            "double drop: {dropped} drops for {created} values"
        );
        created - dropped
    }
}

impl fmt::Debug for DropCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropCounter")
            .field("created", &self.created())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// A value whose clones and drops are recorded by a [`DropCounter`].
pub struct Tracked {
    pub value: i32,
    counter: DropCounter,
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        self.counter.track(self.value)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counter.counts.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({})", self.value)
    }
}
