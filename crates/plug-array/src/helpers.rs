//! Container helpers for plain `Vec`s and fixed-size arrays.
//!
//! [`SmallArray`](crate::SmallArray) carries a set of lookup and editing
//! helpers (`add_unique`, `remove_one`, `index_of`, ...). The same set is
//! available on standard containers through two extension traits:
//!
//! - [`SliceHelpers`] for anything that derefs to a slice, which covers
//!   `[T; N]` and `Vec<T>`: lookups, reordering, resetting.
//! - [`VecHelpers`] for `Vec<T>`: the operations that change the length.
//!
//! Indexing needs no helper: slice indexing is bounds-checked in every
//! build mode.
//!
//! ```
//! use plug_array::{SliceHelpers, VecHelpers};
//!
//! let mut outlets = vec![3, 1, 2];
//! assert!(!outlets.add_unique(1));
//! outlets.move_item(0, 2);
//! assert_eq!(outlets, [1, 2, 3]);
//!
//! let mut fixed = [4u8, 5, 6];
//! assert_eq!(fixed.index_of(&5), Some(1));
//! fixed.reset_to_default();
//! assert_eq!(fixed, [0, 0, 0]);
//! ```

use std::cmp::Ordering;
use std::ptr;

// ── Slices and arrays ──────────────────────────────────────────────

/// Lookup and reordering helpers for slices, arrays and `Vec`s.
pub trait SliceHelpers<T> {
    /// Index of the first element equal to `needle`.
    fn index_of(&self, needle: &T) -> Option<usize>
    where
        T: PartialEq;

    /// Index of the element stored at the same address as `needle`.
    fn index_of_address(&self, needle: &T) -> Option<usize>;

    /// Move the element at `from` to `to`, shifting the ones in between.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    fn move_item(&mut self, from: usize, to: usize);

    /// Overwrite every element with `T::default()`. The length is unchanged.
    fn reset_to_default(&mut self)
    where
        T: Default;
}

impl<T> SliceHelpers<T> for [T] {
    fn index_of(&self, needle: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|item| item == needle)
    }

    fn index_of_address(&self, needle: &T) -> Option<usize> {
        self.iter().position(|item| ptr::eq(item, needle))
    }

    fn move_item(&mut self, from: usize, to: usize) {
        assert!(
            from < self.len() && to < self.len(),
            "move_item indices ({from}, {to}) out of bounds for length {}",
            self.len()
        );
        if from < to {
            self[from..=to].rotate_left(1);
        } else {
            self[to..=from].rotate_right(1);
        }
    }

    fn reset_to_default(&mut self)
    where
        T: Default,
    {
        self.fill_with(T::default);
    }
}

// ── Vec ────────────────────────────────────────────────────────────

/// Length-changing helpers for `Vec<T>`, mirroring [`SmallArray`]'s.
///
/// [`SmallArray`]: crate::SmallArray
pub trait VecHelpers<T> {
    /// Append `value` unless an equal element is already present.
    fn add_unique(&mut self, value: T) -> bool
    where
        T: PartialEq;

    /// Append clones of every element of `items`.
    fn add_array(&mut self, items: &[T])
    where
        T: Clone;

    /// Insert `value` before the first element not less than it. Returns
    /// the insertion index.
    fn add_sorted(&mut self, value: T) -> usize
    where
        T: Ord;

    /// [`add_sorted`](Self::add_sorted) with a custom comparator.
    fn add_sorted_by<F>(&mut self, value: T, compare: F) -> usize
    where
        F: FnMut(&T, &T) -> Ordering;

    /// Remove the first element equal to `needle`.
    fn remove_one(&mut self, needle: &T) -> bool
    where
        T: PartialEq;

    /// Remove every element equal to `needle`. Returns whether any was removed.
    fn remove_all(&mut self, needle: &T) -> bool
    where
        T: PartialEq;

    /// Remove every element matching `predicate`. Returns how many were removed.
    fn remove_if<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&T) -> bool;

    /// Remove the element at `index` if it exists.
    fn remove_at(&mut self, index: usize) -> bool;

    /// Remove `start..end` if it is a valid, non-empty range.
    fn remove_range(&mut self, start: usize, end: usize) -> bool;
}

impl<T> VecHelpers<T> for Vec<T> {
    fn add_unique(&mut self, value: T) -> bool
    where
        T: PartialEq,
    {
        if self.contains(&value) {
            return false;
        }
        self.push(value);
        true
    }

    fn add_array(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.extend_from_slice(items);
    }

    fn add_sorted(&mut self, value: T) -> usize
    where
        T: Ord,
    {
        self.add_sorted_by(value, Ord::cmp)
    }

    fn add_sorted_by<F>(&mut self, value: T, mut compare: F) -> usize
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let index = self.partition_point(|item| compare(item, &value) == Ordering::Less);
        self.insert(index, value);
        index
    }

    fn remove_one(&mut self, needle: &T) -> bool
    where
        T: PartialEq,
    {
        match self.as_slice().index_of(needle) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }

    fn remove_all(&mut self, needle: &T) -> bool
    where
        T: PartialEq,
    {
        let before = self.len();
        self.retain(|item| item != needle);
        self.len() < before
    }

    fn remove_if<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.len();
        self.retain(|item| !predicate(item));
        before - self.len()
    }

    fn remove_at(&mut self, index: usize) -> bool {
        if index < self.len() {
            self.remove(index);
            true
        } else {
            false
        }
    }

    fn remove_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end || end > self.len() {
            return false;
        }
        self.drain(start..end);
        true
    }
}
