//! plug: the container and concurrency core of plugdata.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the sub-crates. For most users, adding `plug` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use plug::prelude::*;
//!
//! // Inline storage for the common case, heap beyond it.
//! let mut connections: SmallArray<u32, 4> = SmallArray::new();
//! connections.extend([3, 1, 2]);
//! connections.add_sorted(0);
//! assert_eq!(connections, [0, 3, 1, 2]);
//! assert!(connections.is_inline());
//!
//! // Stable addresses for long-lived objects.
//! let mut objects: PooledPtrArray<String, 16> = PooledPtrArray::new();
//! let osc: *const String = objects.add("osc~ 440".into());
//! objects.add("dac~".into());
//! objects.erase(0);
//! assert_eq!(objects.add("phasor~".into()) as *const String, osc);
//!
//! // One writer, many readers.
//! let gain: AtomicValue<f32, ReleaseOrAcquire> = AtomicValue::new(1.0);
//! let meter: SeqLock<[f32; 2]> = SeqLock::default();
//! gain.store(0.5);
//! meter.store([0.1, 0.2]);
//! assert_eq!(gain.load(), 0.5);
//! assert_eq!(meter.load(), [0.1, 0.2]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`base`] | `plug-core` | Capacity errors, growth policy, `PointerLike`, defaults |
//! | [`array`] | `plug-array` | `SmallArray`, `PooledPtrArray`, `StackString`, `PointerIntPair` |
//! | [`sync`] | `plug-sync` | `SeqLock`, `AtomicValue`, ordering policies, `RetryPolicy` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Capacity errors, growth policy and shared traits (`plug-core`).
///
/// [`base::next_capacity`] is the single growth rule every container
/// follows; [`base::CapacityError`] is what it reports.
pub use plug_core as base;

/// Array containers (`plug-array`).
///
/// [`array::SmallArray`] for relocatable elements,
/// [`array::PooledPtrArray`] when addresses must stay stable.
pub use plug_array as array;

/// Lock-free value sharing (`plug-sync`).
///
/// [`sync::SeqLock`] for any plain-data value, [`sync::AtomicValue`] for a
/// value that picks its own backing.
pub use plug_sync as sync;

/// Common imports for typical plug usage.
///
/// ```rust
/// use plug::prelude::*;
/// ```
pub mod prelude {
    // Arrays
    pub use plug_array::{
        PointerIntPair, PooledPtrArray, SliceHelpers, SmallArray, StackString, VecHelpers,
    };

    // Sync
    pub use plug_sync::{
        AtomicValue, MemoryOrder, Relaxed, ReleaseOrAcquire, RetryPolicy, SeqLock, Sequential,
    };

    // Errors
    pub use plug_core::CapacityError;
    pub use plug_sync::SyncError;
}
