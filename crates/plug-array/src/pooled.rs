//! Ordered collection of owned objects with stable addresses.
//!
//! [`PooledPtrArray`] owns its elements like a `Vec<Box<T>>`, but carves
//! the objects out of chunks of `BLOCKS_PER_CHUNK` slots instead of
//! allocating each one separately. The logical order lives in a
//! [`SmallArray`] of pointers; the objects themselves never move.
//!
//! Slots are handed out in this order:
//!
//! 1. the run of the current chunk still owed to a [`reserve`] call,
//! 2. the stack region (`STACK_SIZE` slots, allocated on first use),
//! 3. the reuse list (most recently freed first),
//! 4. the remaining slots of the current chunk,
//! 5. a freshly allocated chunk.
//!
//! [`reserve`]: PooledPtrArray::reserve
//!
//! Removing an element drops it and puts its slot on the reuse list.
//! Chunks are only released when the array itself is dropped.

#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

use plug_core::config::DEFAULT_BLOCKS_PER_CHUNK;

use crate::raw;
use crate::small_array::SmallArray;

/// Owned objects with stable addresses, pooled into chunks.
///
/// ```
/// use plug_array::PooledPtrArray;
///
/// let mut names: PooledPtrArray<String, 4> = PooledPtrArray::new();
/// let first: *const String = names.add("osc~".to_string());
/// for i in 0..10 {
///     names.add(format!("obj{i}"));
/// }
/// assert_eq!(names.as_ptr(0), first);
/// assert_eq!(names.chunk_count(), 3);
/// ```
pub struct PooledPtrArray<
    T,
    const BLOCKS_PER_CHUNK: usize = { DEFAULT_BLOCKS_PER_CHUNK },
    const STACK_SIZE: usize = 0,
> {
    data: SmallArray<NonNull<T>, 8>,
    /// Every chunk as `(base, slot count)`.
    chunks: SmallArray<(NonNull<T>, usize), 4>,
    reuse: SmallArray<NonNull<T>, 8>,
    /// Next untouched slot of the newest chunk.
    next_free: NonNull<T>,
    preallocated: usize,
    /// Adds still owed a contiguous run by `reserve`. Never exceeds
    /// `preallocated`.
    reserved_run: usize,
    stack: Option<NonNull<T>>,
    stack_used: usize,
    _owns: PhantomData<T>,
}

// SAFETY: the array owns its objects exactly like Vec<Box<T>>.
unsafe impl<T: Send, const B: usize, const S: usize> Send for PooledPtrArray<T, B, S> {}
// SAFETY: shared access only hands out &T.
unsafe impl<T: Sync, const B: usize, const S: usize> Sync for PooledPtrArray<T, B, S> {}

impl<T, const BLOCKS_PER_CHUNK: usize, const STACK_SIZE: usize>
    PooledPtrArray<T, BLOCKS_PER_CHUNK, STACK_SIZE>
{
    const LAYOUT_CHECK: () = {
        assert!(BLOCKS_PER_CHUNK > 0, "BLOCKS_PER_CHUNK must be at least 1");
        assert!(
            mem::size_of::<T>() > 0,
            "zero-sized types have no distinct addresses to pool"
        );
    };

    /// Create an empty array. Nothing is allocated until the first add.
    pub const fn new() -> Self {
        let () = Self::LAYOUT_CHECK;
        Self {
            data: SmallArray::new(),
            chunks: SmallArray::new(),
            reuse: SmallArray::new(),
            next_free: NonNull::dangling(),
            preallocated: 0,
            reserved_run: 0,
            stack: None,
            stack_used: 0,
            _owns: PhantomData,
        }
    }

    // ── Slot management ─────────────────────────────────────────────

    fn allocate_chunk(&mut self, slots: usize) {
        let base = raw::try_allocate::<T>(slots).unwrap_or_else(|err| raw::fail::<T>(err));
        self.chunks.push((base, slots));
        self.next_free = base;
        self.preallocated = slots;
        log::debug!(
            "pooled array allocated chunk {} with {slots} slots of {} bytes",
            self.chunks.len(),
            mem::size_of::<T>()
        );
    }

    fn take_preallocated(&mut self) -> NonNull<T> {
        debug_assert!(self.preallocated > 0);
        let slot = self.next_free;
        self.preallocated -= 1;
        if self.preallocated > 0 {
            // SAFETY: more slots remain in the current chunk.
            self.next_free = unsafe { slot.add(1) };
        }
        slot
    }

    fn acquire_slot(&mut self) -> NonNull<T> {
        if self.reserved_run > 0 {
            self.reserved_run -= 1;
            return self.take_preallocated();
        }
        if self.stack_used < STACK_SIZE {
            let base = match self.stack {
                Some(base) => base,
                None => {
                    let base = raw::try_allocate::<T>(STACK_SIZE)
                        .unwrap_or_else(|err| raw::fail::<T>(err));
                    self.stack = Some(base);
                    base
                }
            };
            // SAFETY: `stack_used < STACK_SIZE`.
            let slot = unsafe { base.add(self.stack_used) };
            self.stack_used += 1;
            return slot;
        }
        if let Some(slot) = self.reuse.pop() {
            return slot;
        }
        if self.preallocated == 0 {
            self.allocate_chunk(BLOCKS_PER_CHUNK);
        }
        self.take_preallocated()
    }

    fn owns_slot(&self, slot: NonNull<T>) -> bool {
        let within = |base: NonNull<T>, count: usize| {
            let start = base.as_ptr();
            start <= slot.as_ptr() && slot.as_ptr() < start.wrapping_add(count)
        };
        self.stack.is_some_and(|base| within(base, STACK_SIZE))
            || self.chunks.iter().any(|&(base, count)| within(base, count))
    }

    fn release_slot(&mut self, slot: NonNull<T>) {
        debug_assert!(
            self.owns_slot(slot),
            "released slot {slot:p} was not allocated by this array"
        );
        self.reuse.push(slot);
    }

    /// Make sure the next `amount` adds come from one contiguous run.
    ///
    /// If the current chunk has room, its next `amount` slots are set
    /// aside. Otherwise its leftover slots are moved onto the reuse list
    /// and a new chunk of `amount` slots is allocated. Either way the run
    /// is served ahead of the stack region and the reuse list.
    ///
    /// When the reuse list alone covers `amount`, nothing is set aside and
    /// the next adds recycle freed slots, which need not be adjacent.
    fn preallocate(&mut self, amount: usize) {
        if amount == 0 {
            return;
        }
        if amount <= self.preallocated {
            self.reserved_run = self.reserved_run.max(amount);
            return;
        }
        if amount <= self.reuse.len() {
            return;
        }
        while self.preallocated > 0 {
            let slot = self.take_preallocated();
            self.reuse.push(slot);
        }
        self.allocate_chunk(amount);
        self.reserved_run = amount;
    }

    /// Prepare room for `capacity` elements in total.
    ///
    /// The pointer list is grown to `capacity` and storage for the missing
    /// objects is preallocated in a single chunk, so the next
    /// `capacity - len` adds get consecutive addresses. The exception is a
    /// reuse list that already holds enough freed slots: those are
    /// recycled instead.
    pub fn reserve(&mut self, capacity: usize) {
        self.data.reserve(capacity);
        self.preallocate(capacity.saturating_sub(self.data.len()));
    }

    // ── Adding ──────────────────────────────────────────────────────

    /// Append `value` and return a reference to its final location.
    ///
    /// The address stays valid until this element is removed or the array
    /// is dropped.
    pub fn add(&mut self, value: T) -> &mut T {
        let at = self.data.len();
        self.insert(at, value)
    }

    /// Append the value produced by `make`.
    pub fn add_with<F: FnOnce() -> T>(&mut self, make: F) -> &mut T {
        self.add(make())
    }

    /// Insert `value` at position `index` of the logical order.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) -> &mut T {
        assert!(
            index <= self.data.len(),
            "insertion index (is {index}) should be <= len (is {})",
            self.data.len()
        );
        let mut slot = self.acquire_slot();
        // SAFETY: a freshly acquired slot is uninitialised and unaliased.
        unsafe { slot.as_ptr().write(value) };
        self.data.insert(index, slot);
        // SAFETY: the slot was just initialised and is owned by `self`.
        unsafe { slot.as_mut() }
    }

    // ── Removing ────────────────────────────────────────────────────

    /// Remove the element at `index` and return it by value.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn take(&mut self, index: usize) -> T {
        let slot = self.data.remove(index);
        // SAFETY: the slot holds a live object that is now detached.
        let value = unsafe { slot.as_ptr().read() };
        self.release_slot(slot);
        value
    }

    /// Drop the element at `index` and recycle its slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn erase(&mut self, index: usize) {
        let slot = self.data.remove(index);
        // SAFETY: the slot holds a live object that is now detached.
        unsafe { ptr::drop_in_place(slot.as_ptr()) };
        self.release_slot(slot);
    }

    /// Drop the element at `index` if it exists.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index < self.data.len() {
            self.erase(index);
            true
        } else {
            false
        }
    }

    /// Drop the element stored at `target`, if it belongs to this array.
    pub fn remove_one(&mut self, target: *const T) -> bool {
        match self.index_of(target) {
            Some(index) => {
                self.erase(index);
                true
            }
            None => false,
        }
    }

    /// Drop every element matching `predicate`, keeping the order of the
    /// rest. Returns how many were removed.
    pub fn remove_if<F: FnMut(&T) -> bool>(&mut self, mut predicate: F) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.data.len() {
            // SAFETY: every pointer in `data` refers to a live object.
            let doomed = predicate(unsafe { self.data[index].as_ref() });
            if doomed {
                self.erase(index);
                removed += 1;
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Drop every element. Chunks stay allocated for reuse.
    pub fn clear(&mut self) {
        while let Some(slot) = self.data.pop() {
            // SAFETY: the slot held a live object and was just detached.
            unsafe { ptr::drop_in_place(slot.as_ptr()) };
            self.release_slot(slot);
        }
    }

    // ── Ordering ────────────────────────────────────────────────────

    /// Move the element at `from` to position `to`. Addresses are unchanged.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn move_item(&mut self, from: usize, to: usize) {
        self.data.move_item(from, to);
    }

    /// Stable sort of the logical order. Addresses are unchanged.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        // SAFETY: every pointer in `data` refers to a live object.
        self.data
            .sort_by(|a, b| unsafe { compare(a.as_ref(), b.as_ref()) });
    }

    // ── Reading ─────────────────────────────────────────────────────

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the array holds at least one element.
    pub fn not_empty(&self) -> bool {
        self.data.not_empty()
    }

    /// The element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        // SAFETY: every pointer in `data` refers to a live object.
        self.data.get(index).map(|slot| unsafe { slot.as_ref() })
    }

    /// The element at `index` mutably, if any.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        // SAFETY: live and unaliased while `self` is mutably borrowed.
        self.data.get(index).map(|slot| unsafe { &mut *slot.as_ptr() })
    }

    /// The first element, if any.
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// The last element, if any.
    pub fn last(&self) -> Option<&T> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Address of the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn as_ptr(&self, index: usize) -> *const T {
        self.data[index].as_ptr()
    }

    /// The element addresses in logical order.
    pub fn ptrs(&self) -> &[NonNull<T>] {
        &self.data
    }

    /// Position of the element stored at `target`.
    pub fn index_of(&self, target: *const T) -> Option<usize> {
        self.data
            .iter()
            .position(|slot| ptr::eq(slot.as_ptr(), target))
    }

    /// Whether an element of this array is stored at `target`.
    pub fn contains(&self, target: *const T) -> bool {
        self.index_of(target).is_some()
    }

    /// Iterate over the elements in logical order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.data.iter(),
            _items: PhantomData,
        }
    }

    /// Iterate mutably over the elements in logical order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            slots: self.data.iter(),
            _items: PhantomData,
        }
    }

    // ── Diagnostics ─────────────────────────────────────────────────

    /// Number of chunks allocated so far (the stack region excluded).
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Freed slots waiting to be reused.
    pub fn reusable_slots(&self) -> usize {
        self.reuse.len()
    }

    /// Untouched slots left in the newest chunk.
    pub fn preallocated_slots(&self) -> usize {
        self.preallocated
    }

    /// Stack-region slots handed out so far.
    pub fn stack_used(&self) -> usize {
        self.stack_used
    }

    /// Whether consecutive elements occupy consecutive slots.
    pub fn is_contiguous(&self) -> bool {
        self.data
            .windows(2)
            .all(|pair| pair[0].as_ptr().wrapping_add(1) == pair[1].as_ptr())
    }
}

impl<T, const B: usize, const S: usize> Drop for PooledPtrArray<T, B, S> {
    fn drop(&mut self) {
        self.clear();
        for &(base, count) in self.chunks.iter() {
            // SAFETY: chunks were allocated by `raw::try_allocate` with
            // `count` slots and hold no live objects after `clear`.
            unsafe { raw::deallocate(base, count) };
        }
        if let Some(base) = self.stack.take() {
            // SAFETY: as above, with `S` slots.
            unsafe { raw::deallocate(base, S) };
        }
    }
}

impl<T, const B: usize, const S: usize> Default for PooledPtrArray<T, B, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const B: usize, const S: usize> Index<usize> for PooledPtrArray<T, B, S> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        // SAFETY: every pointer in `data` refers to a live object.
        unsafe { self.data[index].as_ref() }
    }
}

impl<T, const B: usize, const S: usize> IndexMut<usize> for PooledPtrArray<T, B, S> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: live and unaliased while `self` is mutably borrowed.
        unsafe { &mut *self.data[index].as_ptr() }
    }
}

impl<T: fmt::Debug, const B: usize, const S: usize> fmt::Debug for PooledPtrArray<T, B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, const B: usize, const S: usize> Extend<T> for PooledPtrArray<T, B, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.add(item);
        }
    }
}

impl<'a, T, const B: usize, const S: usize> IntoIterator for &'a PooledPtrArray<T, B, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, const B: usize, const S: usize> IntoIterator for &'a mut PooledPtrArray<T, B, S> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Iterator over shared references, see [`PooledPtrArray::iter`].
pub struct Iter<'a, T> {
    slots: slice::Iter<'a, NonNull<T>>,
    _items: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        // SAFETY: the array is borrowed for `'a` and its objects are live.
        self.slots.next().map(|slot| unsafe { slot.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: as in `next`.
        self.slots.next_back().map(|slot| unsafe { slot.as_ref() })
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Iterator over mutable references, see [`PooledPtrArray::iter_mut`].
pub struct IterMut<'a, T> {
    slots: slice::Iter<'a, NonNull<T>>,
    _items: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        // SAFETY: the array is mutably borrowed for `'a` and every slot is
        // distinct, so each object is yielded at most once.
        self.slots.next().map(|slot| unsafe { &mut *slot.as_ptr() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: as in `next`.
        self.slots.next_back().map(|slot| unsafe { &mut *slot.as_ptr() })
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}
