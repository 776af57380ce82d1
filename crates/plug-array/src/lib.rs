//! Array containers for plugdata.
//!
//! Containers that keep the allocator off the hot path:
//!
//! ```text
//! SmallArray<T, N>            inline storage for N elements, then heap (2n+1 growth)
//! ├── StackString<N>          UTF-8 text over SmallArray<u8, N>
//! └── PooledPtrArray<T, B, S> SmallArray of pointers into chunks of B slots
//!     ├── stack region        S slots allocated on first use
//!     ├── reuse list          freed slots, most recent first
//!     └── chunks              freed only when the array is dropped
//! PointerIntPair<P, I>        pointer + I-bit integer in one word
//! SliceHelpers, VecHelpers    the SmallArray helper set on [T; N] and Vec<T>
//! ```
//!
//! # Unsafe code
//!
//! The crate denies `unsafe` by default. The storage modules
//! (`raw`, `small_array`, `pooled`) opt back in with a module-level
//! `allow` and document every block with a `SAFETY` comment.
//!
//! # Failure policy
//!
//! Growth beyond a container's size class panics with the
//! [`CapacityError`] message and allocator exhaustion goes through
//! [`std::alloc::handle_alloc_error`]. [`SmallArray::try_reserve`] and
//! [`SmallArray::try_push`] return the error instead.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod helpers;
pub mod pooled;
pub mod ptr_int;
mod raw;
pub mod small_array;
pub mod stack_string;

pub use helpers::{SliceHelpers, VecHelpers};
pub use plug_core::CapacityError;
pub use pooled::PooledPtrArray;
pub use ptr_int::PointerIntPair;
pub use small_array::{preferred_inline_len, SmallArray};
pub use stack_string::StackString;
