//! Text selection handling.
//!
//! A selection is a pair of absolute character offsets with
//! `start <= end`. We treat it as the half-open range `start..end`:
//! - Caret-only selections (start == end) are natural
//! - Length is `end - start`
//! - Consistent with slice semantics when replacing or deleting

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::{BufferError, BufferResult};

/// A selection of text in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
}

impl Selection {
    /// Creates a selection, rejecting reversed bounds.
    pub fn new(start: usize, end: usize) -> BufferResult<Self> {
        if start > end {
            return Err(BufferError::InvalidSelection { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a zero-width selection at an offset.
    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Returns true if nothing is selected.
    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    /// Number of selected characters. Zero if the bounds are reversed.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the selection is a caret.
    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }

    /// Returns the selection as a character range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns true if the selection fits inside a buffer of `len` chars.
    pub fn fits(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
