//! UTF-8 string with inline byte storage.

use std::borrow::Borrow;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::ops::{AddAssign, Deref};
use std::str;

use plug_core::config::DEFAULT_STACK_STRING_BYTES;

use crate::small_array::SmallArray;

/// A string that keeps up to `N` bytes inline before spilling to the heap.
///
/// Used for short labels and formatted numbers that are built and thrown
/// away on hot paths.
///
/// ```
/// use plug_array::StackString;
///
/// let mut label: StackString = StackString::from("gain ");
/// label += "-6 dB";
/// assert_eq!(label, "gain -6 dB");
/// assert!(label.is_inline());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StackString<const N: usize = { DEFAULT_STACK_STRING_BYTES }> {
    bytes: SmallArray<u8, N>,
}

impl<const N: usize> StackString<N> {
    /// Create an empty string.
    pub const fn new() -> Self {
        Self {
            bytes: SmallArray::new(),
        }
    }

    /// Format a float the way `Display` does for `f32`.
    pub fn from_f32(value: f32) -> Self {
        let mut text = Self::new();
        // Writing into a StackString never fails.
        let _ = write!(text, "{value}");
        text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the string is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the bytes still live in the inline buffer.
    pub fn is_inline(&self) -> bool {
        self.bytes.is_inline()
    }

    /// The contents as a string slice.
    pub fn as_str(&self) -> &str {
        // Only whole `&str`s and encoded `char`s are ever appended.
        str::from_utf8(&self.bytes).expect("StackString holds valid UTF-8")
    }

    /// Append one character.
    pub fn push(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut buf));
    }

    /// Append a string slice.
    pub fn push_str(&mut self, text: &str) {
        self.bytes.extend_from_copy_slice(text.as_bytes());
    }

    /// Remove all contents, keeping the capacity.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl<const N: usize> From<&str> for StackString<N> {
    fn from(text: &str) -> Self {
        let mut string = Self::new();
        string.push_str(text);
        string
    }
}

impl<const N: usize> fmt::Write for StackString<N> {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.push_str(text);
        Ok(())
    }
}

impl<const N: usize> AddAssign<&str> for StackString<N> {
    fn add_assign(&mut self, text: &str) {
        self.push_str(text);
    }
}

impl<const N: usize> Deref for StackString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> AsRef<str> for StackString<N> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> Borrow<str> for StackString<N> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<const N: usize> fmt::Display for StackString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> fmt::Debug for StackString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> PartialEq<str> for StackString<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for StackString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

// Must agree with `str`'s hash for `Borrow<str>` lookups.
impl<const N: usize> Hash for StackString<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}
