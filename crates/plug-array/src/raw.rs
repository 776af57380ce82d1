//! Low-level allocation primitives for array storage.
//!
//! Every heap block in this crate goes through these helpers so that the
//! zero-size rule and the fatal failure policy live in one place:
//!
//! - A zero-byte request is issued as a one-byte request. Allocators may
//!   legitimately refuse zero-sized blocks, and `GlobalAlloc` forbids them.
//! - [`fail`] is the single fatal exit. Allocator exhaustion is reported
//!   through [`std::alloc::handle_alloc_error`]; every other
//!   [`CapacityError`] becomes a panic carrying the error message.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use plug_core::{max_len_for, CapacityError};

/// Layout of a block holding `capacity` values of `T`, never zero-sized.
pub(crate) fn array_layout<T>(capacity: usize) -> Result<Layout, CapacityError> {
    let overflow = || CapacityError::SizeOverflow {
        requested: capacity,
        max: max_len_for::<T>(),
    };
    let layout = Layout::array::<T>(capacity).map_err(|_| overflow())?;
    if layout.size() == 0 {
        return Layout::from_size_align(1, layout.align()).map_err(|_| overflow());
    }
    Ok(layout)
}

/// Allocate uninitialised storage for `capacity` values of `T`.
pub(crate) fn try_allocate<T>(capacity: usize) -> Result<NonNull<T>, CapacityError> {
    let layout = array_layout::<T>(capacity)?;
    // SAFETY: `array_layout` never returns a zero-sized layout.
    let ptr = unsafe { alloc::alloc(layout) };
    NonNull::new(ptr.cast()).ok_or(CapacityError::AllocationFailed {
        bytes: layout.size(),
    })
}

/// Resize a block from `old_capacity` to `new_capacity` values of `T`,
/// relocating its bytes if the allocator moves it.
///
/// On error the original block is untouched and still owned by the caller.
///
/// # Safety
///
/// `ptr` must have been returned by [`try_allocate`] or
/// [`try_reallocate`] for exactly `old_capacity` values of `T`.
pub(crate) unsafe fn try_reallocate<T>(
    ptr: NonNull<T>,
    old_capacity: usize,
    new_capacity: usize,
) -> Result<NonNull<T>, CapacityError> {
    let old_layout = array_layout::<T>(old_capacity)?;
    let new_layout = array_layout::<T>(new_capacity)?;
    // SAFETY: the caller guarantees `ptr` was allocated with `old_layout`;
    // both layouts share `T`'s alignment and the new size is non-zero.
    let new_ptr = unsafe { alloc::realloc(ptr.as_ptr().cast(), old_layout, new_layout.size()) };
    NonNull::new(new_ptr.cast()).ok_or(CapacityError::AllocationFailed {
        bytes: new_layout.size(),
    })
}

/// Release a block of `capacity` values of `T` without dropping anything.
///
/// # Safety
///
/// `ptr` must have been returned by [`try_allocate`] or
/// [`try_reallocate`] for exactly `capacity` values of `T`, and must not
/// be used afterwards.
pub(crate) unsafe fn deallocate<T>(ptr: NonNull<T>, capacity: usize) {
    let layout = array_layout::<T>(capacity).expect("layout was valid when the block was allocated");
    // SAFETY: guaranteed by the caller.
    unsafe { alloc::dealloc(ptr.as_ptr().cast(), layout) };
}

/// Fatal exit for a failed growth or allocation.
#[cold]
#[inline(never)]
pub(crate) fn fail<T>(err: CapacityError) -> ! {
    if let CapacityError::AllocationFailed { bytes } = err {
        log::error!("{err}");
        if let Ok(layout) = Layout::from_size_align(bytes, std::mem::align_of::<T>()) {
            alloc::handle_alloc_error(layout);
        }
    }
    panic!("{err}");
}
