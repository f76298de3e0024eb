//! # Scrivener Buffer
//!
//! Text content plus the cursor and selection that commands operate on.
//!
//! ## Key Concepts
//!
//! ### Offsets, not coordinates
//! - Every position handed to a command is an absolute character offset
//! - Line/column pairs (`Position`) only exist for rendering
//!
//! ### Immutable steps
//! - `BufferState` is never edited in place by the interpreter
//! - Each edit produces a new state; the rope underneath shares its chunks,
//!   so keeping the previous state around is cheap

mod buffer;
mod cursor;
mod selection;
mod state;

pub use buffer::TextBuffer;
pub use cursor::Position;
pub use selection::Selection;
pub use state::BufferState;

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
#[serde(tag = "reason")]
pub enum BufferError {
    #[error("Invalid character index {index} (buffer length {len})")]
    InvalidCharIndex { index: usize, len: usize },

    #[error("Selection is invalid: start {start} is after end {end}")]
    InvalidSelection { start: usize, end: usize },
}
