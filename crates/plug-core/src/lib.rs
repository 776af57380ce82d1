//! Core types and traits for the plugdata container library.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the pieces shared by the array and synchronisation crates: the
//! capacity error type, the growth policy, size classes, the
//! [`PointerLike`] capability trait, and the default tuning constants.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod growth;
pub mod traits;

pub use error::CapacityError;
pub use growth::{max_len_for, next_capacity, SizeClass};
pub use traits::PointerLike;
