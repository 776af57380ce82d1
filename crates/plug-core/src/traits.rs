//! Capability traits shared across the container crates.

use std::ptr::NonNull;

/// A value that is a pointer in disguise and can round-trip through a
/// raw `*mut ()` without loss.
///
/// [`LOW_BITS_AVAILABLE`](PointerLike::LOW_BITS_AVAILABLE) is the number
/// of low address bits guaranteed to be zero by the pointee's alignment.
/// Tagged-pointer containers may borrow those bits to store extra data.
pub trait PointerLike: Copy {
    /// Number of low bits that are always zero for a valid value.
    const LOW_BITS_AVAILABLE: u32;

    /// Convert into a type-erased raw pointer, preserving provenance.
    fn into_raw(self) -> *mut ();

    /// Rebuild from a pointer previously produced by
    /// [`into_raw`](PointerLike::into_raw).
    fn from_raw(raw: *mut ()) -> Self;
}

const fn low_bits_of<T>() -> u32 {
    std::mem::align_of::<T>().trailing_zeros()
}

impl<T> PointerLike for *mut T {
    const LOW_BITS_AVAILABLE: u32 = low_bits_of::<T>();

    fn into_raw(self) -> *mut () {
        self.cast()
    }

    fn from_raw(raw: *mut ()) -> Self {
        raw.cast()
    }
}

impl<T> PointerLike for *const T {
    const LOW_BITS_AVAILABLE: u32 = low_bits_of::<T>();

    fn into_raw(self) -> *mut () {
        self.cast_mut().cast()
    }

    fn from_raw(raw: *mut ()) -> Self {
        raw.cast_const().cast()
    }
}

impl<T> PointerLike for NonNull<T> {
    const LOW_BITS_AVAILABLE: u32 = low_bits_of::<T>();

    fn into_raw(self) -> *mut () {
        self.as_ptr().cast()
    }

    fn from_raw(raw: *mut ()) -> Self {
        NonNull::new(raw.cast()).expect("raw pointer originates from a NonNull")
    }
}
