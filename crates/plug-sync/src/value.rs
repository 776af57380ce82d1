//! A value shared across threads, backed by a native atomic when the
//! platform has one and by a [`SeqLock`] otherwise.
//!
//! The backing is picked per type through [`Atomize::Repr`]:
//!
//! ```text
//! AtomicValue<T, O>
//! └── T::Repr
//!     ├── Native<T>   T: NativeAtomic   integers, bool, floats, raw pointers
//!     └── SeqLock<T>  T: Pod            arrays, seqlock_atomize! types
//! ```
//!
//! Read-modify-write operations (`swap`, `compare_exchange_weak`,
//! `fetch_add`, ...) and explicit per-call orderings only exist on the
//! native backing. Asking for them on a SeqLock-backed value does not
//! compile:
//!
//! ```compile_fail
//! use plug_sync::AtomicValue;
//!
//! let rect: AtomicValue<[f32; 4]> = AtomicValue::new([0.0; 4]);
//! rect.swap([1.0; 4]);
//! ```
//!
//! ```compile_fail
//! use std::sync::atomic::Ordering;
//! use plug_sync::AtomicValue;
//!
//! let rect: AtomicValue<[f32; 4]> = AtomicValue::new([0.0; 4]);
//! rect.load_with(Ordering::Relaxed);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::Ordering;

use bytemuck::Pod;

use crate::native::{NativeArithmetic, NativeAtomic};
use crate::order::{MemoryOrder, Sequential};
use crate::seqlock::SeqLock;

/// Storage behind an [`AtomicValue`].
pub trait AtomicRepr<T>: Sized {
    /// Whether this is a native atomic rather than a SeqLock.
    const NATIVE: bool;

    /// Wrap `value`.
    fn new(value: T) -> Self;
    /// Load with policy `O`.
    fn load<O: MemoryOrder>(&self) -> T;
    /// Store with policy `O`.
    fn store<O: MemoryOrder>(&self, value: T);
    /// Unwrap the stored value.
    fn into_inner(self) -> T;
}

/// Native atomic storage for `T`.
pub struct Native<T: NativeAtomic>(T::Atomic);

impl<T: NativeAtomic> AtomicRepr<T> for Native<T> {
    const NATIVE: bool = true;

    fn new(value: T) -> Self {
        Self(T::new_atomic(value))
    }

    fn load<O: MemoryOrder>(&self) -> T {
        T::load(&self.0, O::LOAD)
    }

    fn store<O: MemoryOrder>(&self, value: T) {
        T::store(&self.0, value, O::STORE);
    }

    fn into_inner(self) -> T {
        T::into_inner(self.0)
    }
}

/// SeqLock storage ignores the policy and always uses its own protocol.
impl<T: Pod> AtomicRepr<T> for SeqLock<T> {
    const NATIVE: bool = false;

    fn new(value: T) -> Self {
        SeqLock::new(value)
    }

    fn load<O: MemoryOrder>(&self) -> T {
        SeqLock::load(self)
    }

    fn store<O: MemoryOrder>(&self, value: T) {
        SeqLock::store(self, value);
    }

    fn into_inner(self) -> T {
        SeqLock::into_inner(self)
    }
}

/// Types that can live in an [`AtomicValue`], with their chosen storage.
///
/// Implemented here for the primitives (native where the target allows)
/// and for arrays of [`Pod`] values (SeqLock). Use [`seqlock_atomize!`]
/// for your own `Pod` types.
///
/// [`seqlock_atomize!`]: crate::seqlock_atomize
pub trait Atomize: Copy {
    /// The storage used for `Self`.
    type Repr: AtomicRepr<Self>;
}

/// Back one or more `Pod` types with a [`SeqLock`] inside
/// [`AtomicValue`](crate::AtomicValue).
///
/// ```
/// use bytemuck::{Pod, Zeroable};
/// use plug_sync::{seqlock_atomize, AtomicValue};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
/// #[repr(C)]
/// struct Bounds {
///     x: i32,
///     y: i32,
///     width: i32,
///     height: i32,
/// }
///
/// seqlock_atomize!(Bounds);
///
/// let bounds = AtomicValue::<Bounds>::new(Bounds { x: 0, y: 0, width: 10, height: 10 });
/// assert!(!AtomicValue::<Bounds>::IS_NATIVE);
/// assert_eq!(bounds.load().width, 10);
/// ```
#[macro_export]
macro_rules! seqlock_atomize {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Atomize for $ty {
            type Repr = $crate::SeqLock<$ty>;
        }
    )+};
}

macro_rules! atomize_by_width {
    ($($width:tt => $($ty:ty),+;)*) => {$($(
        #[cfg(target_has_atomic = $width)]
        impl Atomize for $ty {
            type Repr = Native<$ty>;
        }

        #[cfg(not(target_has_atomic = $width))]
        impl Atomize for $ty {
            type Repr = SeqLock<$ty>;
        }
    )+)*};
}

atomize_by_width! {
    "8" => u8, i8;
    "16" => u16, i16;
    "32" => u32, i32, f32;
    "64" => u64, i64, f64;
    "ptr" => usize, isize;
}

#[cfg(target_has_atomic = "8")]
impl Atomize for bool {
    type Repr = Native<bool>;
}

#[cfg(target_has_atomic = "ptr")]
impl<U: 'static> Atomize for *mut U {
    type Repr = Native<*mut U>;
}

#[cfg(target_has_atomic = "ptr")]
impl<U: 'static> Atomize for *const U {
    type Repr = Native<*const U>;
}

impl<T: Pod, const N: usize> Atomize for [T; N] {
    type Repr = SeqLock<[T; N]>;
}

/// A value shared between threads with a static ordering policy.
///
/// `O` is one of [`Relaxed`](crate::Relaxed),
/// [`ReleaseOrAcquire`](crate::ReleaseOrAcquire) or [`Sequential`] (the
/// default) and applies to every [`load`](Self::load) and
/// [`store`](Self::store) on a native backing.
///
/// ```
/// use plug_sync::{AtomicValue, ReleaseOrAcquire};
///
/// let gain: AtomicValue<f32, ReleaseOrAcquire> = AtomicValue::new(1.0);
/// gain.store(0.5);
/// assert_eq!(gain.load(), 0.5);
/// assert_eq!(gain.fetch_add(0.25), 0.5);
/// assert!(AtomicValue::<f32>::IS_NATIVE);
/// ```
pub struct AtomicValue<T: Atomize, O: MemoryOrder = Sequential> {
    repr: T::Repr,
    _order: PhantomData<O>,
}

impl<T: Atomize, O: MemoryOrder> AtomicValue<T, O> {
    /// Whether `T` is stored in a native atomic rather than a SeqLock.
    pub const IS_NATIVE: bool = <T::Repr as AtomicRepr<T>>::NATIVE;

    /// Create a value holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            repr: <T::Repr as AtomicRepr<T>>::new(value),
            _order: PhantomData,
        }
    }

    /// Load with the policy's ordering.
    pub fn load(&self) -> T {
        self.repr.load::<O>()
    }

    /// Store with the policy's ordering.
    pub fn store(&self, value: T) {
        self.repr.store::<O>(value);
    }

    /// Consume and return the value.
    pub fn into_inner(self) -> T {
        self.repr.into_inner()
    }
}

impl<T, O> AtomicValue<T, O>
where
    T: NativeAtomic + Atomize<Repr = Native<T>>,
    O: MemoryOrder,
{
    fn cell(&self) -> &T::Atomic {
        &self.repr.0
    }

    /// Load with an explicit ordering.
    ///
    /// # Panics
    ///
    /// Panics if `order` is `Release` or `AcqRel`.
    pub fn load_with(&self, order: Ordering) -> T {
        T::load(self.cell(), order)
    }

    /// Store with an explicit ordering.
    ///
    /// # Panics
    ///
    /// Panics if `order` is `Acquire` or `AcqRel`.
    pub fn store_with(&self, value: T, order: Ordering) {
        T::store(self.cell(), value, order);
    }

    /// Replace the value, returning the previous one.
    pub fn swap(&self, value: T) -> T {
        T::swap(self.cell(), value, O::RMW)
    }

    /// Store `new` if the current value is `current`. May fail spuriously.
    ///
    /// # Errors
    ///
    /// Returns the actual current value when the exchange did not happen.
    pub fn compare_exchange_weak(&self, current: T, new: T) -> Result<T, T> {
        T::compare_exchange_weak(self.cell(), current, new, O::RMW, O::FAILURE)
    }
}

impl<T, O> AtomicValue<T, O>
where
    T: NativeArithmetic + Atomize<Repr = Native<T>>,
    O: MemoryOrder,
{
    /// Add `value`, returning the previous value.
    pub fn fetch_add(&self, value: T) -> T {
        T::fetch_add(self.cell(), value, O::RMW)
    }

    /// Subtract `value`, returning the previous value.
    pub fn fetch_sub(&self, value: T) -> T {
        T::fetch_sub(self.cell(), value, O::RMW)
    }

    /// Add one and return the previous value.
    pub fn increment(&self) -> T {
        self.fetch_add(T::ONE)
    }

    /// Subtract one and return the previous value.
    pub fn decrement(&self) -> T {
        self.fetch_sub(T::ONE)
    }
}

impl<T: Atomize + Default, O: MemoryOrder> Default for AtomicValue<T, O> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Atomize, O: MemoryOrder> From<T> for AtomicValue<T, O> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Atomize + fmt::Debug, O: MemoryOrder> fmt::Debug for AtomicValue<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicValue").field(&self.load()).finish()
    }
}
