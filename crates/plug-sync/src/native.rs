//! Bridges from plain value types to the standard library atomics.
//!
//! A type implements [`NativeAtomic`] only when the target has a lock-free
//! atomic of its width (`cfg(target_has_atomic = ...)`). Floats ride on
//! the unsigned atomic of the same width through their bit patterns.

use std::sync::atomic::Ordering;
#[cfg(target_has_atomic = "ptr")]
use std::sync::atomic::AtomicPtr;

/// A value type with a lock-free standard atomic counterpart.
pub trait NativeAtomic: Copy + 'static {
    /// The standard atomic cell holding a `Self`.
    type Atomic: Send + Sync;

    /// Wrap `value` in a fresh atomic.
    fn new_atomic(value: Self) -> Self::Atomic;
    /// Atomic load.
    fn load(atomic: &Self::Atomic, order: Ordering) -> Self;
    /// Atomic store.
    fn store(atomic: &Self::Atomic, value: Self, order: Ordering);
    /// Atomic exchange, returning the previous value.
    fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// Weak compare-and-exchange. May fail spuriously.
    fn compare_exchange_weak(
        atomic: &Self::Atomic,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self>;
    /// Unwrap the atomic.
    fn into_inner(atomic: Self::Atomic) -> Self;
}

/// A [`NativeAtomic`] with atomic addition and subtraction.
pub trait NativeArithmetic: NativeAtomic {
    /// The unit step used by increment and decrement.
    const ONE: Self;
    /// Atomic add, returning the previous value. Integers wrap on overflow.
    fn fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
    /// Atomic subtract, returning the previous value. Integers wrap on overflow.
    fn fetch_sub(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self;
}

/// Derive the load ordering of a read-modify-write's retry loop.
fn failure_order(order: Ordering) -> Ordering {
    match order {
        Ordering::Release | Ordering::Relaxed => Ordering::Relaxed,
        Ordering::AcqRel | Ordering::Acquire => Ordering::Acquire,
        _ => Ordering::SeqCst,
    }
}

macro_rules! native_integers {
    ($($width:tt => { $($ty:ty : $atomic:ident),+ $(,)? })*) => {$($(
        #[cfg(target_has_atomic = $width)]
        impl NativeAtomic for $ty {
            type Atomic = std::sync::atomic::$atomic;

            fn new_atomic(value: Self) -> Self::Atomic {
                std::sync::atomic::$atomic::new(value)
            }

            fn load(atomic: &Self::Atomic, order: Ordering) -> Self {
                atomic.load(order)
            }

            fn store(atomic: &Self::Atomic, value: Self, order: Ordering) {
                atomic.store(value, order);
            }

            fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.swap(value, order)
            }

            fn compare_exchange_weak(
                atomic: &Self::Atomic,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                atomic.compare_exchange_weak(current, new, success, failure)
            }

            fn into_inner(atomic: Self::Atomic) -> Self {
                atomic.into_inner()
            }
        }

        #[cfg(target_has_atomic = $width)]
        impl NativeArithmetic for $ty {
            const ONE: Self = 1;

            fn fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_add(value, order)
            }

            fn fetch_sub(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.fetch_sub(value, order)
            }
        }
    )+)*};
}

native_integers! {
    "8" => { u8: AtomicU8, i8: AtomicI8 }
    "16" => { u16: AtomicU16, i16: AtomicI16 }
    "32" => { u32: AtomicU32, i32: AtomicI32 }
    "64" => { u64: AtomicU64, i64: AtomicI64 }
    "ptr" => { usize: AtomicUsize, isize: AtomicIsize }
}

#[cfg(target_has_atomic = "8")]
impl NativeAtomic for bool {
    type Atomic = std::sync::atomic::AtomicBool;

    fn new_atomic(value: Self) -> Self::Atomic {
        std::sync::atomic::AtomicBool::new(value)
    }

    fn load(atomic: &Self::Atomic, order: Ordering) -> Self {
        atomic.load(order)
    }

    fn store(atomic: &Self::Atomic, value: Self, order: Ordering) {
        atomic.store(value, order);
    }

    fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
        atomic.swap(value, order)
    }

    fn compare_exchange_weak(
        atomic: &Self::Atomic,
        current: Self,
        new: Self,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self, Self> {
        atomic.compare_exchange_weak(current, new, success, failure)
    }

    fn into_inner(atomic: Self::Atomic) -> Self {
        atomic.into_inner()
    }
}

macro_rules! native_floats {
    ($($width:tt => $ty:ty : $atomic:ident),+ $(,)?) => {$(
        #[cfg(target_has_atomic = $width)]
        impl NativeAtomic for $ty {
            type Atomic = std::sync::atomic::$atomic;

            fn new_atomic(value: Self) -> Self::Atomic {
                std::sync::atomic::$atomic::new(value.to_bits())
            }

            fn load(atomic: &Self::Atomic, order: Ordering) -> Self {
                <$ty>::from_bits(atomic.load(order))
            }

            fn store(atomic: &Self::Atomic, value: Self, order: Ordering) {
                atomic.store(value.to_bits(), order);
            }

            fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                <$ty>::from_bits(atomic.swap(value.to_bits(), order))
            }

            /// Compares bit patterns: `-0.0` and `0.0` differ, and a NaN
            /// matches an identical NaN.
            fn compare_exchange_weak(
                atomic: &Self::Atomic,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                atomic
                    .compare_exchange_weak(current.to_bits(), new.to_bits(), success, failure)
                    .map(<$ty>::from_bits)
                    .map_err(<$ty>::from_bits)
            }

            fn into_inner(atomic: Self::Atomic) -> Self {
                <$ty>::from_bits(atomic.into_inner())
            }
        }

        #[cfg(target_has_atomic = $width)]
        impl NativeArithmetic for $ty {
            const ONE: Self = 1.0;

            fn fetch_add(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                let previous = atomic
                    .fetch_update(order, failure_order(order), |bits| {
                        Some((<$ty>::from_bits(bits) + value).to_bits())
                    })
                    .unwrap_or_else(|bits| bits);
                <$ty>::from_bits(previous)
            }

            fn fetch_sub(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                Self::fetch_add(atomic, -value, order)
            }
        }
    )+};
}

native_floats! {
    "32" => f32: AtomicU32,
    "64" => f64: AtomicU64,
}

macro_rules! native_pointers {
    ($($ptr:ty),+ $(,)?) => {$(
        #[cfg(target_has_atomic = "ptr")]
        impl<U: 'static> NativeAtomic for $ptr {
            type Atomic = AtomicPtr<U>;

            fn new_atomic(value: Self) -> Self::Atomic {
                AtomicPtr::new(value as *mut U)
            }

            fn load(atomic: &Self::Atomic, order: Ordering) -> Self {
                atomic.load(order) as Self
            }

            fn store(atomic: &Self::Atomic, value: Self, order: Ordering) {
                atomic.store(value as *mut U, order);
            }

            fn swap(atomic: &Self::Atomic, value: Self, order: Ordering) -> Self {
                atomic.swap(value as *mut U, order) as Self
            }

            fn compare_exchange_weak(
                atomic: &Self::Atomic,
                current: Self,
                new: Self,
                success: Ordering,
                failure: Ordering,
            ) -> Result<Self, Self> {
                atomic
                    .compare_exchange_weak(current as *mut U, new as *mut U, success, failure)
                    .map(|ptr| ptr as Self)
                    .map_err(|ptr| ptr as Self)
            }

            fn into_inner(atomic: Self::Atomic) -> Self {
                atomic.into_inner() as Self
            }
        }
    )+};
}

native_pointers!(*mut U, *const U);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip_and_arithmetic() {
        let atomic = u32::new_atomic(5);
        assert_eq!(u32::fetch_add(&atomic, 3, Ordering::SeqCst), 5);
        assert_eq!(u32::fetch_sub(&atomic, 1, Ordering::SeqCst), 8);
        assert_eq!(u32::load(&atomic, Ordering::SeqCst), 7);
        assert_eq!(u32::swap(&atomic, 1, Ordering::SeqCst), 7);
        assert_eq!(u32::into_inner(atomic), 1);
    }

    #[test]
    fn integers_wrap() {
        let atomic = u8::new_atomic(u8::MAX);
        u8::fetch_add(&atomic, 1, Ordering::Relaxed);
        assert_eq!(u8::load(&atomic, Ordering::Relaxed), 0);
    }

    #[test]
    fn float_arithmetic_through_bits() {
        let atomic = f32::new_atomic(1.5);
        assert_eq!(f32::fetch_add(&atomic, 0.25, Ordering::AcqRel), 1.5);
        assert_eq!(f32::fetch_sub(&atomic, 1.0, Ordering::Release), 1.75);
        assert_eq!(f32::load(&atomic, Ordering::Acquire), 0.75);
    }

    #[test]
    fn float_cas_compares_bits() {
        let atomic = f64::new_atomic(0.0);
        let mut result = f64::compare_exchange_weak(
            &atomic,
            -0.0,
            1.0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        assert!(result.is_err(), "-0.0 and 0.0 have different bits");
        loop {
            result = f64::compare_exchange_weak(
                &atomic,
                0.0,
                1.0,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
            if result.is_ok() {
                break;
            }
        }
        assert_eq!(f64::into_inner(atomic), 1.0);
    }

    #[test]
    fn pointers_round_trip() {
        let mut target = 3u64;
        let ptr: *mut u64 = &mut target;
        let atomic = <*mut u64>::new_atomic(std::ptr::null_mut());
        <*mut u64>::store(&atomic, ptr, Ordering::Release);
        assert_eq!(<*mut u64>::load(&atomic, Ordering::Acquire), ptr);

        let constant = <*const u64>::new_atomic(ptr.cast_const());
        assert_eq!(<*const u64>::into_inner(constant), ptr.cast_const());
    }

    #[test]
    fn failure_order_never_releases() {
        assert_eq!(failure_order(Ordering::Release), Ordering::Relaxed);
        assert_eq!(failure_order(Ordering::AcqRel), Ordering::Acquire);
        assert_eq!(failure_order(Ordering::SeqCst), Ordering::SeqCst);
    }
}
