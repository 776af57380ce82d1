//! Lock-free value sharing for plugdata.
//!
//! - [`SeqLock`]: one writer, many readers, any [`bytemuck::Pod`] value.
//!   Stores are wait-free; loads retry while a store overlaps them.
//! - [`AtomicValue`]: a shared value with a static ordering policy
//!   ([`Relaxed`], [`ReleaseOrAcquire`], [`Sequential`]). Backed by a
//!   native atomic when the target has one for the type, by a [`SeqLock`]
//!   otherwise. Read-modify-write operations exist only on the native
//!   backing.
//! - [`RetryPolicy`]: bounds how long a reader waits, for callers that
//!   must not spin indefinitely.
//!
//! Nothing here spawns threads or blocks in the kernel.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod native;
pub mod order;
pub mod seqlock;
pub mod value;

pub use config::{BackoffStyle, RetryPolicy};
pub use error::SyncError;
pub use native::{NativeArithmetic, NativeAtomic};
pub use order::{MemoryOrder, Relaxed, ReleaseOrAcquire, Sequential};
pub use seqlock::SeqLock;
pub use value::{AtomicRepr, AtomicValue, Atomize, Native};
