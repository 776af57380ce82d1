//! Element types for container scenarios.
//!
//! - [`Widget`]: a heap-owning object of the kind kept in pooled arrays.
//! - [`Element`]: one interface over a trivially-copyable type (`u32`)
//!   and a non-trivial wrapper ([`Boxed`]) holding the same values, so a
//!   scenario can be replayed on both and the results compared.
//! - [`Stamp`]: a `Pod` value whose fields must always agree, for
//!   detecting torn reads.

use std::fmt::Debug;

use bytemuck::{Pod, Zeroable};

/// A named UI-ish object with owned heap data.
#[derive(Clone, Debug, PartialEq)]
pub struct Widget {
    pub id: u32,
    pub label: String,
    pub bounds: [i32; 4],
}

impl Widget {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            label: format!("widget-{id}"),
            bounds: [0, 0, 32, 16],
        }
    }
}

/// Common interface over a trivially-copyable element and a non-trivial one.
pub trait Element: Clone + Debug + PartialEq + Default {
    fn make(value: u32) -> Self;
    fn get(&self) -> u32;
}

impl Element for u32 {
    fn make(value: u32) -> Self {
        value
    }

    fn get(&self) -> u32 {
        *self
    }
}

/// Owns its value on the heap, so it has drop glue and a real `Clone`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Boxed(pub Box<u32>);

impl Element for Boxed {
    fn make(value: u32) -> Self {
        Self(Box::new(value))
    }

    fn get(&self) -> u32 {
        *self.0
    }
}

/// Four copies of one counter value. Any mix of values means the reader
/// observed a half-written store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Stamp {
    pub words: [u64; 4],
}

impl Stamp {
    pub fn new(value: u64) -> Self {
        Self { words: [value; 4] }
    }

    /// The stamped value, or `None` if the words disagree.
    pub fn value(&self) -> Option<u64> {
        let first = self.words[0];
        self.words.iter().all(|&w| w == first).then_some(first)
    }
}
