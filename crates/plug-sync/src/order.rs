//! Static memory-ordering policies for [`AtomicValue`](crate::AtomicValue).
//!
//! | Policy               | load      | store     | read-modify-write | CAS failure |
//! |----------------------|-----------|-----------|-------------------|-------------|
//! | [`Relaxed`]          | `Relaxed` | `Relaxed` | `Relaxed`         | `Relaxed`   |
//! | [`ReleaseOrAcquire`] | `Acquire` | `Release` | `AcqRel`          | `Acquire`   |
//! | [`Sequential`]       | `SeqCst`  | `SeqCst`  | `SeqCst`          | `SeqCst`    |
//!
//! SeqLock-backed values ignore the policy; the lock fixes its own
//! acquire/release protocol.

use std::sync::atomic::Ordering;

/// A memory-ordering policy chosen at the type level.
pub trait MemoryOrder: Send + Sync + 'static {
    /// Ordering for plain loads.
    const LOAD: Ordering;
    /// Ordering for plain stores.
    const STORE: Ordering;
    /// Ordering for read-modify-write operations and successful CAS.
    const RMW: Ordering;
    /// Ordering for the load of a failed compare-exchange.
    const FAILURE: Ordering;
}

/// No ordering beyond atomicity of the value itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relaxed;

/// Acquire loads, release stores.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReleaseOrAcquire;

/// Sequentially consistent everything. The default policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequential;

impl MemoryOrder for Relaxed {
    const LOAD: Ordering = Ordering::Relaxed;
    const STORE: Ordering = Ordering::Relaxed;
    const RMW: Ordering = Ordering::Relaxed;
    const FAILURE: Ordering = Ordering::Relaxed;
}

impl MemoryOrder for ReleaseOrAcquire {
    const LOAD: Ordering = Ordering::Acquire;
    const STORE: Ordering = Ordering::Release;
    const RMW: Ordering = Ordering::AcqRel;
    const FAILURE: Ordering = Ordering::Acquire;
}

impl MemoryOrder for Sequential {
    const LOAD: Ordering = Ordering::SeqCst;
    const STORE: Ordering = Ordering::SeqCst;
    const RMW: Ordering = Ordering::SeqCst;
    const FAILURE: Ordering = Ordering::SeqCst;
}
