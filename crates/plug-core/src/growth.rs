//! Capacity growth policy and size classes.
//!
//! Every growable container in the workspace grows through
//! [`next_capacity`]: the new capacity is `2 * old + 1`, raised to the
//! requested minimum and clamped to the largest length the container's
//! size class can represent.

use crate::error::CapacityError;

/// Integer width used to bound a container's length and capacity.
///
/// Byte-sized elements get the wide class on 64-bit targets so that a
/// byte buffer is not limited to 4 GiB; everything else uses 32 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeClass {
    /// Lengths bounded by `u32::MAX`.
    U32,
    /// Lengths bounded by `u64::MAX` (only selected on 64-bit targets).
    U64,
}

impl SizeClass {
    /// The size class for containers holding `T`.
    pub const fn for_element<T>() -> Self {
        if std::mem::size_of::<T>() < 4 && std::mem::size_of::<usize>() >= 8 {
            Self::U64
        } else {
            Self::U32
        }
    }

    /// Largest length representable in this class.
    pub const fn max(self) -> usize {
        match self {
            Self::U32 => u32::MAX as usize,
            Self::U64 => u64::MAX as usize,
        }
    }
}

/// Largest element count a container of `T` may hold.
///
/// The size-class limit, further bounded so that the backing allocation
/// never exceeds `isize::MAX` bytes.
pub const fn max_len_for<T>() -> usize {
    let class_max = SizeClass::for_element::<T>().max();
    let elem = std::mem::size_of::<T>();
    if elem == 0 {
        return class_max;
    }
    let layout_max = isize::MAX as usize / elem;
    if layout_max < class_max {
        layout_max
    } else {
        class_max
    }
}

/// Compute the capacity to grow to.
///
/// Returns `max(2 * old_capacity + 1, min_size)` clamped to `max`.
///
/// # Errors
///
/// - [`CapacityError::SizeOverflow`] if `min_size > max`.
/// - [`CapacityError::AtMaximumCapacity`] if `old_capacity == max`, which
///   the first check misses when growth is requested with a small minimum.
pub fn next_capacity(
    min_size: usize,
    old_capacity: usize,
    max: usize,
) -> Result<usize, CapacityError> {
    if min_size > max {
        return Err(CapacityError::SizeOverflow {
            requested: min_size,
            max,
        });
    }
    if old_capacity == max {
        return Err(CapacityError::AtMaximumCapacity { max });
    }
    let grown = old_capacity.saturating_mul(2).saturating_add(1);
    Ok(grown.clamp(min_size, max))
}
