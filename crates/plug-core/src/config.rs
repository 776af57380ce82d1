//! Default tuning constants shared by the containers.
//!
//! Containers are configured through const generics; these constants are
//! the values used when a caller has no better choice.

/// Target size in bytes of a `SmallArray` header plus its inline storage
/// when the inline length is derived automatically.
pub const PREFERRED_SMALL_ARRAY_BYTES: usize = 64;

/// Largest element size for which an automatic inline length is offered.
///
/// Bigger elements must pick an explicit inline length, so that a large
/// inline footprint is always a deliberate choice.
pub const MAX_DEFAULT_INLINE_ELEMENT_BYTES: usize = 512;

/// Number of object slots in each chunk allocated by a `PooledPtrArray`.
pub const DEFAULT_BLOCKS_PER_CHUNK: usize = 32;

/// Inline byte capacity of a `StackString` when none is given.
pub const DEFAULT_STACK_STRING_BYTES: usize = 64;
