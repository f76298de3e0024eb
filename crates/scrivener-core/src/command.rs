//! The four buffer commands and their failure modes.
//!
//! ## Enums over strings
//!
//! The set of commands is closed, so it's an enum and every consumer
//! matches on it exhaustively. Adding a variant is a compile error
//! everywhere it isn't handled yet, which is exactly where the work is.
//!
//! `Display` renders a command in the same textual form the parser reads,
//! so a command survives being written to a queue and parsed back.

use scrivener_buffer::BufferError;
use serde::{Deserialize, Serialize};

/// A primitive buffer operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    /// Put the caret at an absolute offset.
    Move { position: usize },
    /// Select `start..end` without moving the caret.
    Select { start: usize, end: usize },
    /// Insert at the caret, or replace the selection.
    Insert { text: String },
    /// Remove the selection, or the character before the caret.
    Delete,
}

impl Command {
    /// The keyword the parser recognizes for this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Move { .. } => "MOVE",
            Command::Select { .. } => "SELECT",
            Command::Insert { .. } => "INSERT",
            Command::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Move { position } => write!(f, "MOVE {position}"),
            Command::Select { start, end } => write!(f, "SELECT {start} {end}"),
            // Always quoted so surrounding whitespace survives a re-parse.
            Command::Insert { text } => write!(f, "INSERT \"{text}\""),
            Command::Delete => f.write_str("DELETE"),
        }
    }
}

/// Why a command line could not be parsed or applied.
///
/// None of these are fatal. They end up in an
/// [`ExecutionOutcome`](crate::ExecutionOutcome) and the caller keeps going.
/// Serialized as `{"kind": <variant>, "detail": <fields>}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum CommandError {
    #[error("Invalid command format: {0}")]
    InvalidCommandFormat(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command} requires {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Invalid arguments for {command}: '{args}' (expected {expected})")]
    InvalidArguments {
        command: &'static str,
        args: String,
        expected: &'static str,
    },

    #[error("Position {position} is out of range (0-{len})")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Invalid range {start}-{end} (0-{len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("Nothing to delete: no selection and cursor at start of buffer")]
    NothingToDelete,

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_name() {
        assert_eq!(Command::Move { position: 3 }.name(), "MOVE");
        assert_eq!(Command::Delete.name(), "DELETE");
    }

    #[test]
    fn test_render() {
        assert_eq!(Command::Move { position: 12 }.to_string(), "MOVE 12");
        assert_eq!(
            Command::Select { start: 0, end: 5 }.to_string(),
            "SELECT 0 5"
        );
        assert_eq!(
            Command::Insert {
                text: " hi ".to_string()
            }
            .to_string(),
            "INSERT \" hi \""
        );
        assert_eq!(Command::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_error_messages() {
        let err = CommandError::PositionOutOfRange {
            position: 20,
            len: 11,
        };
        assert_eq!(err.to_string(), "Position 20 is out of range (0-11)");
        assert!(
            CommandError::NothingToDelete
                .to_string()
                .starts_with("Nothing to delete")
        );
    }

    #[test]
    fn test_error_serializes_with_kind() {
        let err = CommandError::InvalidRange {
            start: 4,
            end: 2,
            len: 3,
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"kind": "InvalidRange", "detail": {"start": 4, "end": 2, "len": 3}})
        );
        assert_eq!(
            serde_json::to_value(CommandError::NothingToDelete).unwrap(),
            serde_json::json!({"kind": "NothingToDelete"})
        );
        assert_eq!(
            serde_json::to_value(CommandError::UnknownCommand("JUMP".to_string())).unwrap(),
            serde_json::json!({"kind": "UnknownCommand", "detail": "JUMP"})
        );
        assert_eq!(
            serde_json::to_value(CommandError::from(BufferError::InvalidCharIndex {
                index: 9,
                len: 3
            }))
            .unwrap(),
            serde_json::json!({
                "kind": "Buffer",
                "detail": {"reason": "InvalidCharIndex", "index": 9, "len": 3}
            })
        );
    }
}
