//! Text content backed by a rope.
//!
//! ## Why Rope?
//!
//! The interpreter produces a fresh `BufferState` for every command. With a
//! `String` that means copying the whole document per step; `Rope::clone`
//! only bumps reference counts, and an edit only rebuilds the touched path
//! of the tree.
//!
//! All indices are character indices (Unicode scalar values), never bytes.

use ropey::Rope;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::ops::Range;

use crate::{BufferError, BufferResult, Position};

/// The text under edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use scrivener_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    // ==================== Text Access ====================

    /// Returns the entire text content.
    ///
    /// Borrowed when the rope is a single chunk, allocated otherwise.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns a slice of text by character range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<String> {
        self.check_range(&range)?;
        Ok(self.rope.slice(range).into())
    }

    /// Returns the lines of the buffer split on `\n`.
    ///
    /// The terminators are not included. An empty buffer has one empty
    /// line, and a trailing `\n` yields a final empty line.
    pub fn lines(&self) -> Vec<String> {
        self.text().split('\n').map(str::to_string).collect()
    }

    // ==================== Measurements ====================

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of characters in the buffer.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of `\n`-separated lines.
    pub fn line_count(&self) -> usize {
        self.rope.chars().filter(|c| *c == '\n').count() + 1
    }

    // ==================== Mutations ====================

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<()> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex {
                index: char_idx,
                len: self.len_chars(),
            });
        }
        self.rope.insert(char_idx, text);
        Ok(())
    }

    /// Deletes text in a character range, returning what was removed.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<String> {
        self.check_range(&range)?;
        let deleted: String = self.rope.slice(range.clone()).into();
        self.rope.remove(range);
        Ok(deleted)
    }

    /// Replaces text in a range with new text, returning what was removed.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> BufferResult<String> {
        let start = range.start;
        let deleted = self.delete(range)?;
        self.insert(start, text)?;
        Ok(deleted)
    }

    // ==================== Position Conversion ====================

    /// Converts a character index to a line/column position.
    ///
    /// Only `\n` counts as a line break, matching [`TextBuffer::lines`].
    pub fn position_of(&self, char_idx: usize) -> BufferResult<Position> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex {
                index: char_idx,
                len: self.len_chars(),
            });
        }

        let mut line = 0;
        let mut line_start = 0;
        for (idx, ch) in self.rope.chars().take(char_idx).enumerate() {
            if ch == '\n' {
                line += 1;
                line_start = idx + 1;
            }
        }

        Ok(Position::new(line, char_idx - line_start))
    }

    fn check_range(&self, range: &Range<usize>) -> BufferResult<()> {
        if range.start > range.end {
            return Err(BufferError::InvalidSelection {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex {
                index: range.end,
                len: self.len_chars(),
            });
        }
        Ok(())
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

// Hosts see the buffer as a plain string.
impl Serialize for TextBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text())
    }
}

impl<'de> Deserialize<'de> for TextBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::from(text))
    }
}
