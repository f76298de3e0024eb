//! The state a command runs against.
//!
//! `BufferState` bundles content, cursor and selection and only hands out
//! values that satisfy
//!
//! ```text
//! 0 <= cursor <= len
//! 0 <= selection.start <= selection.end <= len
//! ```
//!
//! Fields are private so the only way to get a state is through a
//! constructor that checks them. Every constructor returns a new value;
//! nothing here edits a state in place.

use serde::{Deserialize, Serialize};

use crate::{BufferError, BufferResult, Selection, TextBuffer};

/// Content plus caret and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawState")]
pub struct BufferState {
    content: TextBuffer,
    cursor: usize,
    selection: Selection,
}

impl BufferState {
    /// Creates a state with the caret at the start of `content`.
    pub fn new(content: TextBuffer) -> Self {
        Self {
            content,
            cursor: 0,
            selection: Selection::caret(0),
        }
    }

    /// Builds a state from raw parts, validating every bound.
    pub fn from_parts(
        content: TextBuffer,
        cursor: usize,
        selection: Selection,
    ) -> BufferResult<Self> {
        let len = content.len_chars();
        if cursor > len {
            return Err(BufferError::InvalidCharIndex { index: cursor, len });
        }
        if selection.start > selection.end {
            return Err(BufferError::InvalidSelection {
                start: selection.start,
                end: selection.end,
            });
        }
        if selection.end > len {
            return Err(BufferError::InvalidCharIndex {
                index: selection.end,
                len,
            });
        }

        Ok(Self {
            content,
            cursor,
            selection,
        })
    }

    /// Returns a copy with the caret at `cursor` and no selection.
    pub fn with_cursor(&self, cursor: usize) -> BufferResult<Self> {
        Self::from_parts(self.content.clone(), cursor, Selection::caret(cursor))
    }

    /// Returns a copy with `selection` applied and the caret left alone.
    pub fn with_selection(&self, selection: Selection) -> BufferResult<Self> {
        Self::from_parts(self.content.clone(), self.cursor, selection)
    }

    // ==================== Accessors ====================

    /// The text under edit.
    pub fn content(&self) -> &TextBuffer {
        &self.content
    }

    /// Absolute caret offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current selection; a caret when nothing is selected.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Content length in characters.
    pub fn len(&self) -> usize {
        self.content.len_chars()
    }

    /// Returns true if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns true if a non-empty range is selected.
    pub fn has_selection(&self) -> bool {
        !self.selection.is_caret()
    }

    /// The selected text, if any.
    pub fn selected_text(&self) -> Option<String> {
        if !self.has_selection() {
            return None;
        }
        self.content.slice(self.selection.range()).ok()
    }
}

impl From<&str> for BufferState {
    fn from(s: &str) -> Self {
        Self::new(TextBuffer::from(s))
    }
}

impl From<String> for BufferState {
    fn from(s: String) -> Self {
        Self::new(TextBuffer::from(s))
    }
}

/// Unchecked wire shape; deserialization goes through `from_parts`.
#[derive(Deserialize)]
struct RawState {
    content: TextBuffer,
    cursor: usize,
    selection: Selection,
}

impl TryFrom<RawState> for BufferState {
    type Error = BufferError;

    fn try_from(raw: RawState) -> Result<Self, Self::Error> {
        Self::from_parts(raw.content, raw.cursor, raw.selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_validates_cursor() {
        let err = BufferState::from_parts(TextBuffer::from("abc"), 4, Selection::caret(0));
        assert_eq!(err, Err(BufferError::InvalidCharIndex { index: 4, len: 3 }));
    }

    #[test]
    fn test_from_parts_validates_selection() {
        let sel = Selection { start: 2, end: 1 };
        let err = BufferState::from_parts(TextBuffer::from("abc"), 0, sel);
        assert_eq!(err, Err(BufferError::InvalidSelection { start: 2, end: 1 }));

        let sel = Selection { start: 1, end: 9 };
        assert!(BufferState::from_parts(TextBuffer::from("abc"), 0, sel).is_err());
    }

    #[test]
    fn test_with_cursor_collapses_selection() {
        let state = BufferState::from("hello")
            .with_selection(Selection::new(1, 4).unwrap())
            .unwrap();
        assert!(state.has_selection());

        let moved = state.with_cursor(2).unwrap();
        assert_eq!(moved.cursor(), 2);
        assert_eq!(moved.selection(), Selection::caret(2));
        // the original is untouched
        assert_eq!(state.selection(), Selection::new(1, 4).unwrap());
    }

    #[test]
    fn test_selected_text() {
        let state = BufferState::from("hello world")
            .with_selection(Selection::new(6, 11).unwrap())
            .unwrap();
        assert_eq!(state.selected_text().as_deref(), Some("world"));
        assert_eq!(BufferState::from("x").selected_text(), None);
    }

    #[test]
    fn test_deserialize_rejects_bad_cursor() {
        let json = r#"{"content":"ab","cursor":5,"selection":{"start":0,"end":0}}"#;
        assert!(serde_json::from_str::<BufferState>(json).is_err());

        let json = r#"{"content":"ab","cursor":1,"selection":{"start":0,"end":2}}"#;
        let state: BufferState = serde_json::from_str(json).unwrap();
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.selected_text().as_deref(), Some("ab"));
    }
}
