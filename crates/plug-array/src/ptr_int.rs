//! A pointer and a small integer packed into one machine word.
//!
//! The integer lives in the low address bits that the pointee's alignment
//! guarantees to be zero, packed against the top of that free range:
//!
//! ```text
//! bit:  63 ..................... L | L-1 .... L-I | L-I-1 .... 0
//!       pointer bits               | integer     | unused
//!                           (L = LOW_BITS_AVAILABLE, I = INT_BITS)
//! ```
//!
//! All bit manipulation goes through the strict-provenance pointer APIs,
//! so the stored word keeps the provenance of the original pointer.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use plug_core::PointerLike;

/// A pointer-like value and an `INT_BITS`-wide integer in one word.
///
/// Asking for more integer bits than the pointer type has free alignment
/// bits is rejected at compile time:
///
/// ```compile_fail
/// use plug_array::PointerIntPair;
///
/// let half = 0u16;
/// // u16 is 2-aligned: one free bit, two requested.
/// let pair = PointerIntPair::<*const u16, 2>::new(&half, 1);
/// ```
///
/// ```
/// use plug_array::PointerIntPair;
///
/// let value = 42u64;
/// let mut pair = PointerIntPair::<*const u64, 2>::new(&value, 3);
/// assert_eq!(pair.int(), 3);
/// pair.set_int(1);
/// // SAFETY: the pointer still refers to `value`.
/// assert_eq!(unsafe { *pair.pointer() }, 42);
/// ```
pub struct PointerIntPair<P: PointerLike, const INT_BITS: u32> {
    value: *mut (),
    _pointer: PhantomData<P>,
}

impl<P: PointerLike, const INT_BITS: u32> PointerIntPair<P, INT_BITS> {
    const FITS: () = assert!(
        INT_BITS <= P::LOW_BITS_AVAILABLE,
        "PointerIntPair has more integer bits than the pointer has free alignment bits"
    );
    const INT_SHIFT: u32 = P::LOW_BITS_AVAILABLE - INT_BITS;
    const INT_MASK: usize = (1usize << INT_BITS) - 1;
    const SHIFTED_INT_MASK: usize = Self::INT_MASK << Self::INT_SHIFT;
    const POINTER_MASK: usize = !((1usize << P::LOW_BITS_AVAILABLE) - 1);

    /// Pack `pointer` and `int`.
    ///
    /// # Panics
    ///
    /// Panics if `int` does not fit in `INT_BITS` bits, or if `pointer`
    /// is not aligned as its type requires.
    pub fn new(pointer: P, int: usize) -> Self {
        let mut pair = Self::from_pointer(pointer);
        pair.set_int(int);
        pair
    }

    /// Pack `pointer` with an integer of zero.
    pub fn from_pointer(pointer: P) -> Self {
        let () = Self::FITS;
        Self {
            value: Self::checked_pointer(pointer),
            _pointer: PhantomData,
        }
    }

    fn checked_pointer(pointer: P) -> *mut () {
        let raw = pointer.into_raw();
        assert_eq!(
            raw.addr() & !Self::POINTER_MASK,
            0,
            "pointer {raw:p} is not sufficiently aligned to borrow its low bits"
        );
        raw
    }

    /// The stored pointer.
    pub fn pointer(&self) -> P {
        P::from_raw(self.value.map_addr(|addr| addr & Self::POINTER_MASK))
    }

    /// The stored integer.
    pub fn int(&self) -> usize {
        (self.value.addr() >> Self::INT_SHIFT) & Self::INT_MASK
    }

    /// Replace the pointer, keeping the integer.
    pub fn set_pointer(&mut self, pointer: P) {
        let raw = Self::checked_pointer(pointer);
        let low = self.value.addr() & !Self::POINTER_MASK;
        self.value = raw.map_addr(|addr| addr | low);
    }

    /// Replace the integer, keeping the pointer.
    ///
    /// # Panics
    ///
    /// Panics if `int` does not fit in `INT_BITS` bits.
    pub fn set_int(&mut self, int: usize) {
        assert!(
            int <= Self::INT_MASK,
            "integer {int} is too large for a {INT_BITS}-bit field"
        );
        let shifted = int << Self::INT_SHIFT;
        self.value = self
            .value
            .map_addr(|addr| (addr & !Self::SHIFTED_INT_MASK) | shifted);
    }

    /// Replace both halves.
    pub fn set_pointer_and_int(&mut self, pointer: P, int: usize) {
        *self = Self::new(pointer, int);
    }

    /// The packed word, for storage in an untyped slot.
    pub fn opaque_value(&self) -> *mut () {
        self.value
    }

    /// Rebuild a pair from [`opaque_value`](Self::opaque_value).
    pub fn from_opaque_value(value: *mut ()) -> Self {
        let () = Self::FITS;
        Self {
            value,
            _pointer: PhantomData,
        }
    }
}

impl<P: PointerLike, const I: u32> Clone for PointerIntPair<P, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: PointerLike, const I: u32> Copy for PointerIntPair<P, I> {}

impl<P: PointerLike, const I: u32> PartialEq for PointerIntPair<P, I> {
    fn eq(&self, other: &Self) -> bool {
        self.value.addr() == other.value.addr()
    }
}

impl<P: PointerLike, const I: u32> Eq for PointerIntPair<P, I> {}

impl<P: PointerLike, const I: u32> PartialOrd for PointerIntPair<P, I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: PointerLike, const I: u32> Ord for PointerIntPair<P, I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.addr().cmp(&other.value.addr())
    }
}

impl<P: PointerLike, const I: u32> Hash for PointerIntPair<P, I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.addr().hash(state);
    }
}

impl<P: PointerLike, const I: u32> fmt::Debug for PointerIntPair<P, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerIntPair")
            .field("pointer", &self.pointer().into_raw())
            .field("int", &self.int())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr::NonNull;

    #[test]
    fn int_sits_in_top_free_bits() {
        let values = [10u64, 20, 30];
        let ptr: *const u64 = &values[1];
        // u64: three free bits, two used, so the int is shifted by one.
        let pair: PointerIntPair<*const u64, 2> = PointerIntPair::new(ptr, 3);
        assert_eq!(pair.opaque_value().addr(), ptr.addr() | 0b110);
        assert_eq!(pair.pointer(), ptr);
        assert_eq!(pair.int(), 3);
    }

    #[test]
    fn halves_update_independently() {
        let values = [1u32, 2];
        let mut pair = PointerIntPair::<*const u32, 1>::from_pointer(&values[0]);
        assert_eq!(pair.int(), 0);
        pair.set_int(1);
        pair.set_pointer(&values[1]);
        assert_eq!(pair.int(), 1);
        assert_eq!(pair.pointer(), &values[1] as *const u32);

        pair.set_pointer_and_int(&values[0], 0);
        assert_eq!(pair.pointer(), &values[0] as *const u32);
        assert_eq!(pair.int(), 0);
    }

    #[test]
    fn opaque_round_trip() {
        let mut value = 5u64;
        let ptr = NonNull::from(&mut value);
        let pair: PointerIntPair<NonNull<u64>, 3> = PointerIntPair::new(ptr, 5);
        let back = PointerIntPair::<NonNull<u64>, 3>::from_opaque_value(pair.opaque_value());
        assert_eq!(back, pair);
        assert_eq!(back.pointer(), ptr);
        assert_eq!(back.int(), 5);
    }

    #[test]
    fn zero_int_bits_store_only_the_pointer() {
        let value = 1u8;
        let pair = PointerIntPair::<*const u8, 0>::new(&value, 0);
        assert_eq!(pair.pointer(), &value as *const u8);
        assert_eq!(pair.int(), 0);
    }

    #[test]
    #[should_panic(expected = "too large for a 2-bit field")]
    fn oversized_int_panics() {
        let value = 0u64;
        let _ = PointerIntPair::<*const u64, 2>::new(&value, 4);
    }

    #[test]
    #[should_panic(expected = "not sufficiently aligned")]
    fn misaligned_pointer_panics() {
        let bytes = [0u8; 8];
        let odd = (0..2)
            .map(|offset| bytes.as_ptr().wrapping_add(offset))
            .find(|ptr| ptr.addr() % 2 == 1)
            .unwrap()
            .cast::<u32>();
        let _ = PointerIntPair::<*const u32, 1>::from_pointer(odd);
    }

    #[test]
    fn ordering_follows_packed_word() {
        let values = [0u64; 2];
        let low = PointerIntPair::<*const u64, 1>::new(&values[0], 1);
        let high = PointerIntPair::<*const u64, 1>::new(&values[1], 0);
        assert!(low < high);
        assert_ne!(low, PointerIntPair::<*const u64, 1>::new(&values[0], 0));
    }
}
