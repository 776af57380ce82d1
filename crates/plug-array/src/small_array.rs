//! Growable array with inline storage for the first `N` elements.
//!
//! [`SmallArray`] keeps up to `N` elements inside the value itself and only
//! touches the heap once it outgrows them. Capacity then grows as
//! `2 * capacity + 1` (see [`plug_core::next_capacity`]).
//!
//! # Storage states
//!
//! ```text
//! inline ("small")                 heap
//! ┌─────┬─────┬──────┬─────────┐   ┌─────┬─────┬──────────┬─────────┐
//! │ len │ cap │ None │ [T; N]  │──▶│ len │ cap │ Some(p)  │ unused  │
//! └─────┴─────┴──────┴─────────┘   └─────┴─────┴────┬─────┴─────────┘
//!         cap == N                                  └──▶ [T; cap]
//! ```
//!
//! The transition happens once per growth event, and an array never
//! returns to the inline state except when its heap block is moved out by
//! [`SmallArray::take_from`] or [`std::mem::take`].
//!
//! # Copy fast path
//!
//! Relocating elements (growth, shifting on insert/erase, moving a small
//! array) is always a byte copy, since every Rust value may be moved with
//! `memcpy`. Duplicating elements is where trivially-copyable types
//! differ: the `*_copy*` methods require `T: Copy` and duplicate whole
//! ranges with one `copy_nonoverlapping`, while the general methods call
//! [`Clone::clone`] per element. Range destruction is skipped entirely for
//! types without drop glue.
//!
//! # Preconditions
//!
//! Out-of-range indices panic in every build mode; [`SmallArray::pop`] on
//! an empty array returns `None`.

#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop, MaybeUninit};
use std::ops::{Bound, Deref, DerefMut, RangeBounds};
use std::ptr::{self, NonNull};
use std::slice;

use plug_core::config::{MAX_DEFAULT_INLINE_ELEMENT_BYTES, PREFERRED_SMALL_ARRAY_BYTES};
use plug_core::{max_len_for, next_capacity, CapacityError};

use crate::helpers::SliceHelpers;
use crate::raw;

/// Default inline length for a `SmallArray<T, _>`.
///
/// Picks as many elements as fit in [`PREFERRED_SMALL_ARRAY_BYTES`] after
/// the array header, and never fewer than one. Element types larger than
/// [`MAX_DEFAULT_INLINE_ELEMENT_BYTES`] are rejected; evaluating this in a
/// const context then fails to compile.
///
/// ```
/// use plug_array::{preferred_inline_len, SmallArray};
///
/// let mut ids: SmallArray<u32, { preferred_inline_len::<u32>() }> = SmallArray::new();
/// ids.push(1);
/// assert!(ids.capacity() >= 1);
/// ```
pub const fn preferred_inline_len<T>() -> usize {
    let elem = mem::size_of::<T>();
    assert!(
        elem <= MAX_DEFAULT_INLINE_ELEMENT_BYTES,
        "element type is too large for a default inline length; pick one explicitly"
    );
    if elem == 0 {
        return 1;
    }
    let header = mem::size_of::<SmallArray<T, 0>>();
    let fits = PREFERRED_SMALL_ARRAY_BYTES.saturating_sub(header) / elem;
    if fits == 0 {
        1
    } else {
        fits
    }
}

/// A vector that stores its first `N` elements inline.
///
/// Behaves like `Vec<T>` for reads through [`Deref<Target = [T]>`](Deref)
/// and adds the container helpers used throughout plugdata
/// ([`add_unique`](Self::add_unique), [`remove_one`](Self::remove_one),
/// [`add_sorted`](Self::add_sorted), ...).
pub struct SmallArray<T, const N: usize> {
    len: usize,
    capacity: usize,
    /// `None` while the elements live in `inline`.
    heap: Option<NonNull<T>>,
    inline: [MaybeUninit<T>; N],
    _owns: PhantomData<T>,
}

// SAFETY: SmallArray owns its elements exactly like Vec<T>.
unsafe impl<T: Send, const N: usize> Send for SmallArray<T, N> {}
// SAFETY: shared access only hands out &T.
unsafe impl<T: Sync, const N: usize> Sync for SmallArray<T, N> {}

impl<T, const N: usize> SmallArray<T, N> {
    /// Create an empty array using its inline storage.
    pub const fn new() -> Self {
        Self {
            len: 0,
            capacity: N,
            heap: None,
            inline: [const { MaybeUninit::uninit() }; N],
            _owns: PhantomData,
        }
    }

    /// Create an empty array with room for at least `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut array = Self::new();
        array.reserve(capacity);
        array
    }

    /// Number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of elements the current storage can hold without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the array holds at least one element.
    #[inline]
    pub fn not_empty(&self) -> bool {
        self.len != 0
    }

    /// Whether the elements still live in the inline storage.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.heap.is_none()
    }

    /// Largest number of elements this array type can ever hold.
    pub const fn max_len() -> usize {
        max_len_for::<T>()
    }

    /// Pointer to the first element slot, valid even when empty.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match self.heap {
            Some(ptr) => ptr.as_ptr(),
            None => self.inline.as_ptr().cast(),
        }
    }

    /// Mutable pointer to the first element slot, valid even when empty.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        match self.heap {
            Some(ptr) => ptr.as_ptr(),
            None => self.inline.as_mut_ptr().cast(),
        }
    }

    /// The live elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        // SAFETY: the first `len` slots are initialised.
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    // ── Growth ──────────────────────────────────────────────────────

    fn try_grow(&mut self, min_capacity: usize) -> Result<(), CapacityError> {
        let new_capacity = next_capacity(min_capacity, self.capacity, Self::max_len())?;
        let new_ptr = match self.heap {
            // SAFETY: the heap block was allocated for `self.capacity` values.
            Some(old) => unsafe { raw::try_reallocate(old, self.capacity, new_capacity)? },
            None => {
                let fresh = raw::try_allocate::<T>(new_capacity)?;
                // SAFETY: the inline storage holds `len` initialised values and
                // the fresh block has room for `new_capacity >= len` of them.
                unsafe {
                    ptr::copy_nonoverlapping(
                        self.inline.as_ptr().cast::<T>(),
                        fresh.as_ptr(),
                        self.len,
                    );
                }
                log::trace!(
                    "small array spilled {} inline elements to the heap (capacity {new_capacity})",
                    self.len
                );
                fresh
            }
        };
        self.heap = Some(new_ptr);
        self.capacity = new_capacity;
        Ok(())
    }

    fn grow(&mut self, min_capacity: usize) {
        if let Err(err) = self.try_grow(min_capacity) {
            raw::fail::<T>(err);
        }
    }

    /// Make sure `additional` more elements fit, growing if needed.
    fn reserve_for(&mut self, additional: usize) {
        let needed = self.len.checked_add(additional).unwrap_or_else(|| {
            raw::fail::<T>(CapacityError::SizeOverflow {
                requested: usize::MAX,
                max: Self::max_len(),
            })
        });
        if needed > self.capacity {
            self.grow(needed);
        }
    }

    /// Grow the capacity to at least `min_capacity`. Never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if `min_capacity` exceeds [`max_len`](Self::max_len); aborts
    /// through [`std::alloc::handle_alloc_error`] if the allocator fails.
    pub fn reserve(&mut self, min_capacity: usize) {
        if self.capacity < min_capacity {
            self.grow(min_capacity);
        }
    }

    /// Fallible variant of [`reserve`](Self::reserve).
    ///
    /// # Errors
    ///
    /// Returns the [`CapacityError`] that [`reserve`](Self::reserve) would
    /// have treated as fatal. The array is unchanged on error.
    pub fn try_reserve(&mut self, min_capacity: usize) -> Result<(), CapacityError> {
        if self.capacity < min_capacity {
            self.try_grow(min_capacity)?;
        }
        Ok(())
    }

    // ── Appending and removing at the end ───────────────────────────

    /// Append an element, growing first if the array is full.
    ///
    /// Element addresses are invalidated only when growth happens.
    pub fn push(&mut self, value: T) {
        if self.len == self.capacity {
            self.grow(self.len + 1);
        }
        // SAFETY: `len < capacity` after the growth check.
        unsafe { self.as_mut_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    /// Append an element, returning an error instead of failing fatally.
    ///
    /// # Errors
    ///
    /// Returns the growth error; `value` is dropped in that case.
    pub fn try_push(&mut self, value: T) -> Result<(), CapacityError> {
        if self.len == self.capacity {
            let needed = self.len.checked_add(1).ok_or(CapacityError::AtMaximumCapacity {
                max: Self::max_len(),
            })?;
            self.try_grow(needed)?;
        }
        self.push(value);
        Ok(())
    }

    /// Append an element and return a reference to it.
    pub fn push_mut(&mut self, value: T) -> &mut T {
        self.push(value);
        let last = self.len - 1;
        &mut self.as_mut_slice()[last]
    }

    /// Remove and return the last element, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` is initialised and now
        // outside the live range, so it is read exactly once.
        Some(unsafe { self.as_ptr().add(self.len).read() })
    }

    /// Drop the last `count` elements.
    ///
    /// # Panics
    ///
    /// Panics if `count > len`.
    pub fn pop_n(&mut self, count: usize) {
        assert!(
            count <= self.len,
            "cannot pop {count} elements from an array of length {}",
            self.len
        );
        self.truncate(self.len - count);
    }

    /// Shorten the array to `len` elements, dropping the rest.
    ///
    /// Has no effect if `len` is not smaller than the current length.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = self.len - len;
        self.len = len;
        if mem::needs_drop::<T>() {
            // SAFETY: the `tail` slots after `len` are initialised and no
            // longer part of the live range.
            unsafe {
                let start = self.as_mut_ptr().add(len);
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, tail));
            }
        }
    }

    /// Drop every element. The capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    // ── Insertion ───────────────────────────────────────────────────

    /// Open a gap of `count` uninitialised slots at `index`.
    ///
    /// On return `len` is `index`, so a panic while the gap is being filled
    /// leaks the tail instead of dropping uninitialised memory. The caller
    /// must fill the gap and then set `len` to `old_len + count`.
    fn open_gap(&mut self, index: usize, count: usize) -> (*mut T, usize) {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );
        self.reserve_for(count);
        let old_len = self.len;
        let base = self.as_mut_ptr();
        // SAFETY: capacity covers `old_len + count`; `ptr::copy` handles the
        // overlapping shift.
        unsafe {
            ptr::copy(base.add(index), base.add(index + count), old_len - index);
        }
        self.len = index;
        // SAFETY: `index <= capacity`.
        (unsafe { base.add(index) }, old_len)
    }

    /// Insert `value` at `index`, shifting later elements right.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        let (gap, old_len) = self.open_gap(index, 1);
        // SAFETY: `gap` is the single uninitialised slot opened above.
        unsafe { gap.write(value) };
        self.len = old_len + 1;
    }

    /// Insert `count` clones of `value` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_n(&mut self, index: usize, count: usize, value: T)
    where
        T: Clone,
    {
        if count == 0 {
            assert!(
                index <= self.len,
                "insertion index (is {index}) should be <= len (is {})",
                self.len
            );
            return;
        }
        let (gap, old_len) = self.open_gap(index, count);
        // SAFETY: `gap` points at `count` uninitialised slots.
        unsafe {
            for i in 0..count - 1 {
                gap.add(i).write(value.clone());
            }
            gap.add(count - 1).write(value);
        }
        self.len = old_len + count;
    }

    /// Insert clones of every element of `values` at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_from_slice(&mut self, index: usize, values: &[T])
    where
        T: Clone,
    {
        let (gap, old_len) = self.open_gap(index, values.len());
        for (i, value) in values.iter().enumerate() {
            // SAFETY: `gap` points at `values.len()` uninitialised slots.
            unsafe { gap.add(i).write(value.clone()) };
        }
        self.len = old_len + values.len();
    }

    /// Insert a copy of `values` at `index` with a single byte copy.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_copy_slice(&mut self, index: usize, values: &[T])
    where
        T: Copy,
    {
        let (gap, old_len) = self.open_gap(index, values.len());
        // SAFETY: `values` cannot alias `self` (it is borrowed separately)
        // and `gap` points at `values.len()` uninitialised slots.
        unsafe { ptr::copy_nonoverlapping(values.as_ptr(), gap, values.len()) };
        self.len = old_len + values.len();
    }

    /// Insert every item produced by `items` at `index`, in order.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_many<I>(&mut self, index: usize, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        assert!(
            index <= self.len,
            "insertion index (is {index}) should be <= len (is {})",
            self.len
        );
        let old_len = self.len;
        self.extend(items);
        let added = self.len - old_len;
        self.as_mut_slice()[index..].rotate_right(added);
    }

    // ── Erasure ─────────────────────────────────────────────────────

    /// Remove and return the element at `index`, shifting later ones left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "removal index (is {index}) should be < len (is {})",
            self.len
        );
        let base = self.as_mut_ptr();
        // SAFETY: `index` is in bounds; the value is read out once and the
        // tail shifted over its slot.
        unsafe {
            let value = base.add(index).read();
            ptr::copy(base.add(index + 1), base.add(index), self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Remove the element at `index`, replacing it with the last element.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        assert!(
            index < self.len,
            "swap_remove index (is {index}) should be < len (is {})",
            self.len
        );
        let last = self.len - 1;
        self.as_mut_slice().swap(index, last);
        self.len = last;
        // SAFETY: the old last slot is initialised and outside the live range.
        unsafe { self.as_ptr().add(last).read() }
    }

    /// Drop the elements in `range` and close the gap. Never shrinks.
    ///
    /// # Panics
    ///
    /// Panics if the range is decreasing or extends past `len`.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = self.resolve_range(range);
        if start == end {
            return;
        }
        let old_len = self.len;
        // Elements from `start` on are detached until the tail is moved back.
        self.len = start;
        let base = self.as_mut_ptr();
        // SAFETY: `start..end` is initialised and detached from the live
        // range; the tail is then shifted down over it.
        unsafe {
            if mem::needs_drop::<T>() {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), end - start));
            }
            ptr::copy(base.add(end), base.add(start), old_len - end);
        }
        self.len = old_len - (end - start);
    }

    fn resolve_range<R: RangeBounds<usize>>(&self, range: R) -> (usize, usize) {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e + 1,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        assert!(start <= end, "range start {start} is after end {end}");
        assert!(
            end <= self.len,
            "range end {end} is out of bounds for length {}",
            self.len
        );
        (start, end)
    }

    /// Keep only the elements for which `keep` returns `true`, in order.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) {
        let len = self.len;
        let mut kept = 0;
        {
            let items = self.as_mut_slice();
            for i in 0..len {
                if keep(&items[i]) {
                    if kept != i {
                        items.swap(kept, i);
                    }
                    kept += 1;
                }
            }
        }
        self.truncate(kept);
    }

    // ── Resizing ────────────────────────────────────────────────────

    /// Resize to exactly `len` elements, filling with values from `fill`.
    pub fn resize_with<F: FnMut() -> T>(&mut self, len: usize, mut fill: F) {
        if len <= self.len {
            self.truncate(len);
            return;
        }
        self.reserve(len);
        while self.len < len {
            self.push(fill());
        }
    }

    /// Resize to exactly `len` elements, filling with clones of `value`.
    pub fn resize(&mut self, len: usize, value: T)
    where
        T: Clone,
    {
        if len <= self.len {
            self.truncate(len);
        } else {
            let at = self.len;
            self.insert_n(at, len - at, value);
        }
    }

    /// Resize to exactly `len` elements, filling with `T::default()`.
    pub fn resize_default(&mut self, len: usize)
    where
        T: Default,
    {
        self.resize_with(len, T::default);
    }

    /// Resize to exactly `len` elements, filling with bitwise copies of
    /// `value`.
    pub fn resize_copy(&mut self, len: usize, value: T)
    where
        T: Copy,
    {
        if len <= self.len {
            self.truncate(len);
            return;
        }
        self.reserve(len);
        let base = self.as_mut_ptr();
        for i in self.len..len {
            // SAFETY: `i < capacity`; copies cannot panic.
            unsafe { base.add(i).write(value) };
        }
        self.len = len;
    }

    // ── Bulk construction ───────────────────────────────────────────

    /// Append clones of every element in `values`.
    pub fn extend_from_slice(&mut self, values: &[T])
    where
        T: Clone,
    {
        let at = self.len;
        self.insert_from_slice(at, values);
    }

    /// Append `values` with a single byte copy.
    pub fn extend_from_copy_slice(&mut self, values: &[T])
    where
        T: Copy,
    {
        let at = self.len;
        self.insert_copy_slice(at, values);
    }

    /// Build an array from a slice of trivially-copyable values.
    pub fn from_copy_slice(values: &[T]) -> Self
    where
        T: Copy,
    {
        let mut array = Self::new();
        array.extend_from_copy_slice(values);
        array
    }

    /// Move every element of `other` into `self`, leaving `other` empty.
    ///
    /// The current contents of `self` are dropped first. A heap-backed
    /// `other` hands over its block in O(1) and returns to its inline
    /// storage; an inline `other` has its elements moved one by one into
    /// `self`'s storage.
    pub fn take_from<const M: usize>(&mut self, other: &mut SmallArray<T, M>) {
        self.clear();
        match other.heap.take() {
            Some(block) => {
                if let Some(own) = self.heap.take() {
                    // SAFETY: our block was allocated for `self.capacity`
                    // values and holds no live elements after `clear`.
                    unsafe { raw::deallocate(own, self.capacity) };
                }
                self.heap = Some(block);
                self.capacity = other.capacity;
                self.len = other.len;
                other.capacity = M;
                other.len = 0;
            }
            None => {
                let count = other.len;
                self.reserve(count);
                // SAFETY: `other`'s inline storage holds `count` initialised
                // values; ownership moves to `self` once `other.len` is zeroed.
                unsafe {
                    ptr::copy_nonoverlapping(
                        other.inline.as_ptr().cast::<T>(),
                        self.as_mut_ptr(),
                        count,
                    );
                }
                other.len = 0;
                self.len = count;
            }
        }
    }

    // ── Container helpers ───────────────────────────────────────────

    /// Index of the first element equal to `needle`.
    pub fn index_of(&self, needle: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        SliceHelpers::index_of(self.as_slice(), needle)
    }

    /// Index of the element stored at the same address as `needle`.
    pub fn index_of_address(&self, needle: &T) -> Option<usize> {
        SliceHelpers::index_of_address(self.as_slice(), needle)
    }

    /// Remove the first element equal to `needle`. Returns whether one was found.
    pub fn remove_one(&mut self, needle: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(needle) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every element equal to `needle`. Returns whether any was removed.
    pub fn remove_all(&mut self, needle: &T) -> bool
    where
        T: PartialEq,
    {
        let before = self.len;
        self.retain(|item| item != needle);
        self.len < before
    }

    /// Remove every element matching `predicate`. Returns how many were removed.
    pub fn remove_if<F: FnMut(&T) -> bool>(&mut self, mut predicate: F) -> usize {
        let before = self.len;
        self.retain(|item| !predicate(item));
        before - self.len
    }

    /// Remove the element at `index` if it exists.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index < self.len {
            self.remove(index);
            true
        } else {
            false
        }
    }

    /// Remove `start..end` if it is a valid, non-empty range.
    pub fn remove_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end || start >= self.len || end > self.len {
            return false;
        }
        self.erase_range(start..end);
        true
    }

    /// Append `value` unless an equal element is already present.
    pub fn add_unique(&mut self, value: T) -> bool
    where
        T: PartialEq,
    {
        if self.contains(&value) {
            return false;
        }
        self.push(value);
        true
    }

    /// Insert `value` before the first element not less than it.
    ///
    /// Keeps a sorted array sorted. Returns the insertion index.
    pub fn add_sorted(&mut self, value: T) -> usize
    where
        T: Ord,
    {
        let index = self.partition_point(|item| item < &value);
        self.insert(index, value);
        index
    }

    /// [`add_sorted`](Self::add_sorted) with a custom comparator.
    pub fn add_sorted_by<F>(&mut self, value: T, mut compare: F) -> usize
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let index = self.partition_point(|item| compare(item, &value) == Ordering::Less);
        self.insert(index, value);
        index
    }

    /// Move the element at `from` to `to`, shifting the ones in between.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn move_item(&mut self, from: usize, to: usize) {
        SliceHelpers::move_item(self.as_mut_slice(), from, to);
    }
}

impl<T, const N: usize> Drop for SmallArray<T, N> {
    fn drop(&mut self) {
        self.clear();
        if let Some(block) = self.heap {
            // SAFETY: the block was allocated for `self.capacity` values and
            // holds no live elements after `clear`.
            unsafe { raw::deallocate(block, self.capacity) };
        }
    }
}

impl<T, const N: usize> Default for SmallArray<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for SmallArray<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for SmallArray<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, const N: usize> AsRef<[T]> for SmallArray<T, N> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> AsMut<[T]> for SmallArray<T, N> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, const N: usize> Clone for SmallArray<T, N> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        copy.extend_from_slice(self);
        copy
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for SmallArray<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, const N: usize, const M: usize> PartialEq<SmallArray<T, M>>
    for SmallArray<T, N>
{
    fn eq(&self, other: &SmallArray<T, M>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T]> for SmallArray<T, N> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, const N: usize, const K: usize> PartialEq<[T; K]> for SmallArray<T, N> {
    fn eq(&self, other: &[T; K]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, const N: usize> Eq for SmallArray<T, N> {}

impl<T: Hash, const N: usize> Hash for SmallArray<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T, const N: usize> Extend<T> for SmallArray<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        let items = items.into_iter();
        let (lower, _) = items.size_hint();
        self.reserve_for(lower);
        for item in items {
            self.push(item);
        }
    }
}

impl<'a, T: Copy + 'a, const N: usize> Extend<&'a T> for SmallArray<T, N> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, items: I) {
        self.extend(items.into_iter().copied());
    }
}

impl<T, const N: usize> FromIterator<T> for SmallArray<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut array = Self::new();
        array.extend(items);
        array
    }
}

impl<T: Clone, const N: usize> From<&[T]> for SmallArray<T, N> {
    fn from(values: &[T]) -> Self {
        let mut array = Self::new();
        array.extend_from_slice(values);
        array
    }
}

impl<T, const N: usize, const K: usize> From<[T; K]> for SmallArray<T, N> {
    fn from(values: [T; K]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a SmallArray<T, N> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a mut SmallArray<T, N> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, const N: usize> IntoIterator for SmallArray<T, N> {
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    fn into_iter(self) -> Self::IntoIter {
        let mut array = ManuallyDrop::new(self);
        let tail = array.len;
        array.len = 0;
        IntoIter {
            array: ManuallyDrop::into_inner(array),
            head: 0,
            tail,
        }
    }
}

/// Owning iterator over the elements of a [`SmallArray`].
pub struct IntoIter<T, const N: usize> {
    /// Storage with `len == 0`; the live range is `head..tail`.
    array: SmallArray<T, N>,
    head: usize,
    tail: usize,
}

impl<T, const N: usize> IntoIter<T, N> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `head..tail` is the initialised, not yet yielded range.
        unsafe {
            slice::from_raw_parts(self.array.as_ptr().add(self.head), self.tail - self.head)
        }
    }
}

impl<T, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        // SAFETY: `head` is inside the live range and is read exactly once.
        let value = unsafe { self.array.as_ptr().add(self.head).read() };
        self.head += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tail - self.head;
        (remaining, Some(remaining))
    }
}

impl<T, const N: usize> DoubleEndedIterator for IntoIter<T, N> {
    fn next_back(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        // SAFETY: the old `tail - 1` is inside the live range and read once.
        Some(unsafe { self.array.as_ptr().add(self.tail).read() })
    }
}

impl<T, const N: usize> ExactSizeIterator for IntoIter<T, N> {}

impl<T, const N: usize> FusedIterator for IntoIter<T, N> {}

impl<T, const N: usize> Drop for IntoIter<T, N> {
    fn drop(&mut self) {
        let remaining = self.tail - self.head;
        if mem::needs_drop::<T>() && remaining > 0 {
            // SAFETY: `head..tail` holds the initialised values never yielded.
            unsafe {
                let start = self.array.as_mut_ptr().add(self.head);
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(start, remaining));
            }
        }
        // `array.len` is zero, so dropping it only releases the heap block.
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for IntoIter<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plug_test_utils::{DropCounter, Tracked};
    use std::rc::Rc;

    #[test]
    fn new_array_is_inline_with_capacity_n() {
        let array: SmallArray<u32, 4> = SmallArray::new();
        assert_eq!(array.len(), 0);
        assert_eq!(array.capacity(), 4);
        assert!(array.is_inline());
        assert!(array.is_empty());
        assert!(!array.not_empty());
    }

    #[test]
    fn stays_inline_until_full() {
        let mut array: SmallArray<u32, 4> = SmallArray::new();
        for i in 0..4 {
            array.push(i);
        }
        assert!(array.is_inline());
        assert_eq!(array.capacity(), 4);

        array.push(4);
        assert!(!array.is_inline());
        // 2 * 4 + 1
        assert_eq!(array.capacity(), 9);
        let block = array.as_ptr();
        for i in 5..9 {
            array.push(i);
        }
        assert_eq!(array.as_ptr(), block, "no reallocation before capacity is reached");
        assert_eq!(array, [0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn zero_inline_capacity_goes_straight_to_heap() {
        let mut array: SmallArray<u64, 0> = SmallArray::new();
        assert_eq!(array.capacity(), 0);
        array.push(1);
        assert!(!array.is_inline());
        assert_eq!(array.capacity(), 1);
        array.push(2);
        assert_eq!(array.capacity(), 3);
    }

    #[test]
    fn pop_returns_last_and_none_when_empty() {
        let mut array: SmallArray<String, 2> = SmallArray::new();
        array.push("a".into());
        array.push("b".into());
        assert_eq!(array.pop().as_deref(), Some("b"));
        assert_eq!(array.pop().as_deref(), Some("a"));
        assert_eq!(array.pop(), None);
    }

    #[test]
    fn insert_shifts_tail() {
        let mut array: SmallArray<i32, 2> = SmallArray::from([1, 3]);
        array.insert(1, 2);
        array.insert(0, 0);
        array.insert(4, 4);
        assert_eq!(array, [0, 1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "insertion index (is 3) should be <= len (is 2)")]
    fn insert_past_end_panics() {
        let mut array: SmallArray<i32, 2> = SmallArray::from([1, 2]);
        array.insert(3, 9);
    }

    #[test]
    fn insert_n_and_slices() {
        let mut array: SmallArray<String, 2> = SmallArray::new();
        array.push("x".into());
        array.insert_n(0, 2, "a".to_string());
        array.insert_from_slice(3, &["y".to_string(), "z".to_string()]);
        assert_eq!(array, ["a", "a", "x", "y", "z"].map(String::from));
    }

    #[test]
    fn insert_copy_slice_in_middle() {
        let mut array: SmallArray<u8, 4> = SmallArray::from_copy_slice(&[1, 5]);
        array.insert_copy_slice(1, &[2, 3, 4]);
        assert_eq!(array, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn insert_many_preserves_order() {
        let mut array: SmallArray<i32, 3> = SmallArray::from([1, 5]);
        array.insert_many(1, 2..5);
        assert_eq!(array, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn remove_and_erase_range_never_shrink() {
        let mut array: SmallArray<i32, 2> = (0..10).collect();
        let capacity = array.capacity();
        assert_eq!(array.remove(0), 0);
        array.erase_range(2..5);
        assert_eq!(array, [1, 2, 6, 7, 8, 9]);
        array.erase_range(..);
        assert!(array.is_empty());
        assert_eq!(array.capacity(), capacity);
    }

    #[test]
    fn erase_range_drops_removed_elements() {
        let counter = DropCounter::new();
        let mut array: SmallArray<Tracked, 2> = (0..6).map(|i| counter.track(i)).collect();
        array.erase_range(1..4);
        assert_eq!(counter.dropped(), 3);
        assert_eq!(
            array.iter().map(|t| t.value).collect::<Vec<_>>(),
            vec![0, 4, 5]
        );
        drop(array);
        assert_eq!(counter.dropped(), 6);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn swap_remove_takes_last() {
        let mut array: SmallArray<i32, 4> = SmallArray::from([1, 2, 3, 4]);
        assert_eq!(array.swap_remove(0), 1);
        assert_eq!(array, [4, 2, 3]);
    }

    #[test]
    fn reserve_never_shrinks() {
        let mut array: SmallArray<i32, 2> = SmallArray::new();
        array.reserve(100);
        assert_eq!(array.capacity(), 100);
        array.reserve(10);
        assert_eq!(array.capacity(), 100);
    }

    #[test]
    fn try_reserve_reports_overflow_without_changing_array() {
        let mut array: SmallArray<u64, 2> = SmallArray::from([1, 2]);
        let err = array.try_reserve(usize::MAX).unwrap_err();
        assert!(matches!(err, CapacityError::SizeOverflow { .. }));
        assert!(array.is_inline());
        assert_eq!(array, [1, 2]);
    }

    #[test]
    #[should_panic(expected = "larger than maximum value for size type")]
    fn reserve_beyond_max_is_fatal() {
        let mut array: SmallArray<u64, 2> = SmallArray::new();
        array.reserve(SmallArray::<u64, 2>::max_len() + 1);
    }

    #[test]
    fn resize_grows_and_truncates() {
        let counter = DropCounter::new();
        let mut array: SmallArray<Tracked, 2> = SmallArray::new();
        array.resize_with(5, || counter.track(7));
        assert_eq!(array.len(), 5);
        array.resize_with(2, || counter.track(0));
        assert_eq!(counter.dropped(), 3);

        let mut numbers: SmallArray<i32, 2> = SmallArray::new();
        numbers.resize(3, 9);
        assert_eq!(numbers, [9, 9, 9]);
        numbers.resize_default(5);
        assert_eq!(numbers, [9, 9, 9, 0, 0]);
        numbers.resize_copy(6, 1);
        assert_eq!(numbers, [9, 9, 9, 0, 0, 1]);
        numbers.resize_copy(1, 1);
        assert_eq!(numbers, [9]);
    }

    #[test]
    fn pop_n_truncates() {
        let mut array: SmallArray<i32, 4> = SmallArray::from([1, 2, 3, 4]);
        array.pop_n(3);
        assert_eq!(array, [1]);
    }

    #[test]
    #[should_panic(expected = "cannot pop 2 elements")]
    fn pop_n_past_len_panics() {
        let mut array: SmallArray<i32, 4> = SmallArray::from([1]);
        array.pop_n(2);
    }

    #[test]
    fn take_from_heap_source_steals_block() {
        let mut source: SmallArray<String, 2> = (0..5).map(|i| i.to_string()).collect();
        assert!(!source.is_inline());
        let block = source.as_ptr();

        let mut dest: SmallArray<String, 8> = SmallArray::new();
        dest.take_from(&mut source);

        assert_eq!(dest.as_ptr(), block);
        assert_eq!(dest.len(), 5);
        assert!(source.is_empty());
        assert!(source.is_inline());
        assert_eq!(source.capacity(), 2);
    }

    #[test]
    fn take_from_inline_source_moves_elements() {
        let counter = DropCounter::new();
        let mut source: SmallArray<Tracked, 4> = (0..3).map(|i| counter.track(i)).collect();
        assert!(source.is_inline());

        let mut dest: SmallArray<Tracked, 1> = SmallArray::new();
        dest.push(counter.track(99));
        dest.take_from(&mut source);

        // Only the previous content of `dest` was dropped.
        assert_eq!(counter.dropped(), 1);
        assert!(source.is_empty());
        assert!(source.is_inline());
        assert_eq!(dest.iter().map(|t| t.value).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn mem_take_leaves_inline_empty_source() {
        let mut source: SmallArray<i32, 2> = (0..10).collect();
        let moved = mem::take(&mut source);
        assert_eq!(moved.len(), 10);
        assert!(source.is_empty());
        assert!(source.is_inline());
    }

    #[test]
    fn clone_is_deep() {
        let shared = Rc::new(5);
        let mut array: SmallArray<Rc<i32>, 2> = SmallArray::new();
        array.push(Rc::clone(&shared));
        array.push(Rc::clone(&shared));
        array.push(Rc::clone(&shared));
        let copy = array.clone();
        assert_eq!(Rc::strong_count(&shared), 7);
        assert_eq!(copy, array);
        drop(array);
        drop(copy);
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn helpers_follow_container_semantics() {
        let mut array: SmallArray<i32, 4> = SmallArray::new();
        assert!(array.add_unique(3));
        assert!(array.add_unique(1));
        assert!(!array.add_unique(3));
        assert_eq!(array.index_of(&1), Some(1));
        assert_eq!(array.index_of(&7), None);

        array.extend([3, 3, 2]);
        assert!(array.remove_one(&3));
        assert_eq!(array, [1, 3, 3, 2]);
        assert!(array.remove_all(&3));
        assert!(!array.remove_all(&3));
        assert_eq!(array, [1, 2]);

        assert!(array.remove_at(0));
        assert!(!array.remove_at(5));
        assert_eq!(array, [2]);
    }

    #[test]
    fn add_sorted_keeps_order() {
        let mut array: SmallArray<i32, 4> = SmallArray::new();
        for value in [5, 1, 4, 1, 3] {
            array.add_sorted(value);
        }
        assert_eq!(array, [1, 1, 3, 4, 5]);
        assert_eq!(array.add_sorted(2), 2);

        let mut desc: SmallArray<i32, 4> = SmallArray::new();
        for value in [1, 3, 2] {
            desc.add_sorted_by(value, |a, b| b.cmp(a));
        }
        assert_eq!(desc, [3, 2, 1]);
    }

    #[test]
    fn remove_range_validates() {
        let mut array: SmallArray<i32, 4> = (0..6).collect();
        assert!(!array.remove_range(3, 3));
        assert!(!array.remove_range(4, 7));
        assert!(array.remove_range(1, 3));
        assert_eq!(array, [0, 3, 4, 5]);
    }

    #[test]
    fn remove_if_counts_removed() {
        let mut array: SmallArray<i32, 4> = (0..10).collect();
        assert_eq!(array.remove_if(|v| v % 3 == 0), 4);
        assert_eq!(array, [1, 2, 4, 5, 7, 8]);
    }

    #[test]
    fn move_item_rotates() {
        let mut array: SmallArray<char, 8> = "abcde".chars().collect();
        array.move_item(0, 3);
        assert_eq!(array, ['b', 'c', 'd', 'a', 'e']);
        array.move_item(4, 0);
        assert_eq!(array, ['e', 'b', 'c', 'd', 'a']);
    }

    #[test]
    fn index_of_address_distinguishes_equal_values() {
        let array: SmallArray<i32, 4> = SmallArray::from([7, 7, 7]);
        assert_eq!(array.index_of_address(&array[2]), Some(2));
        let outside = 7;
        assert_eq!(array.index_of_address(&outside), None);
    }

    #[test]
    fn into_iter_drops_unconsumed() {
        let counter = DropCounter::new();
        let array: SmallArray<Tracked, 2> = (0..5).map(|i| counter.track(i)).collect();
        let mut iter = array.into_iter();
        assert_eq!(iter.next().map(|t| t.value), Some(0));
        assert_eq!(iter.next_back().map(|t| t.value), Some(4));
        assert_eq!(iter.len(), 3);
        drop(iter);
        assert_eq!(counter.live(), 0);
    }

    #[test]
    fn into_iter_from_inline_storage() {
        let array: SmallArray<String, 4> = ["a", "b"].map(String::from).into();
        let collected: Vec<String> = array.into_iter().collect();
        assert_eq!(collected, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn zero_sized_elements() {
        let mut array: SmallArray<(), 1> = SmallArray::new();
        for _ in 0..100 {
            array.push(());
        }
        assert_eq!(array.len(), 100);
        array.erase_range(10..90);
        assert_eq!(array.len(), 20);
    }

    #[test]
    fn preferred_inline_len_fills_64_bytes() {
        let header = mem::size_of::<SmallArray<u8, 0>>();
        assert_eq!(preferred_inline_len::<u8>(), 64 - header);
        assert_eq!(preferred_inline_len::<[u8; 200]>(), 1);
        assert_eq!(preferred_inline_len::<()>(), 1);
    }

    #[test]
    fn is_send_and_sync_for_send_sync_elements() {
        fn assert<T: Send + Sync>() {}
        assert::<SmallArray<u32, 4>>();
        assert::<SmallArray<String, 0>>();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn push_keeps_len_within_capacity_and_order(
                values in proptest::collection::vec(any::<u32>(), 0..200),
            ) {
                let mut array: SmallArray<u32, 4> = SmallArray::new();
                for (i, &v) in values.iter().enumerate() {
                    array.push(v);
                    prop_assert!(array.len() <= array.capacity());
                    prop_assert_eq!(array.len(), i + 1);
                }
                prop_assert_eq!(array.as_slice(), values.as_slice());
                prop_assert_eq!(array.is_inline(), values.len() <= 4);
            }

            #[test]
            fn retain_matches_vec(
                values in proptest::collection::vec(0u8..10, 0..64),
                cutoff in 0u8..10,
            ) {
                let mut array: SmallArray<u8, 8> = SmallArray::from_copy_slice(&values);
                let mut expected = values.clone();
                array.retain(|&v| v < cutoff);
                expected.retain(|&v| v < cutoff);
                prop_assert_eq!(array.as_slice(), expected.as_slice());
            }
        }
    }
}
