//! Applying one command to one state.
//!
//! `execute` is a pure function: it reads the state it is given and
//! nothing else, and describes the result as an [`ExecutionOutcome`].
//! The caller decides whether to fold that outcome into its state with
//! [`ExecutionOutcome::apply_to`].
//!
//! ## Transitions
//!
//! ```text
//! MOVE p        cursor = p, selection = p..p
//! SELECT s e    selection = s..e, cursor unchanged
//! INSERT t      replace selection (or insert at cursor), caret after t
//! DELETE        remove selection (or char before cursor), caret at start
//! ```
//!
//! A failed command is a self-loop: the outcome carries no new values.

use scrivener_buffer::{BufferState, Selection, TextBuffer};
use serde::{Serialize, Serializer};

use crate::command::{Command, CommandError};

/// Result of attempting one command against one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// The command that was attempted; `None` when the line didn't parse.
    pub command: Option<Command>,
    /// Human-readable summary for logs.
    pub message: String,
    /// Set when the command failed.
    pub error: Option<CommandError>,
    /// New content, if it changed.
    pub content: Option<TextBuffer>,
    /// New caret offset, if it changed.
    pub cursor: Option<usize>,
    /// New selection, if it changed.
    pub selection: Option<Selection>,
}

impl ExecutionOutcome {
    /// Builds a failed outcome that leaves state untouched.
    pub fn failure(command: Option<Command>, error: CommandError) -> Self {
        Self {
            command,
            message: error.to_string(),
            error: Some(error),
            content: None,
            cursor: None,
            selection: None,
        }
    }

    /// Builds the outcome for a line that could not be parsed.
    pub fn rejected(error: CommandError) -> Self {
        Self::failure(None, error)
    }

    /// Returns true if the command succeeded.
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Folds the outcome into `state`, producing the successor state.
    ///
    /// Fields the outcome doesn't carry are taken from `state`. If the
    /// combination would break the buffer invariants the outcome is
    /// dropped and `state` is returned unchanged.
    pub fn apply_to(&self, state: &BufferState) -> BufferState {
        if !self.success() {
            return state.clone();
        }

        let content = self
            .content
            .clone()
            .unwrap_or_else(|| state.content().clone());
        let cursor = self.cursor.unwrap_or(state.cursor());
        let selection = self.selection.unwrap_or(state.selection());

        match BufferState::from_parts(content, cursor, selection) {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!("Discarding inconsistent outcome '{}': {}", self.message, err);
                state.clone()
            }
        }
    }
}

/// What hosts see: the outcome plus an explicit `success` flag.
#[derive(Serialize)]
struct OutcomeRecord<'a> {
    success: bool,
    command: &'a Option<Command>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a CommandError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a TextBuffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection: Option<Selection>,
}

impl Serialize for ExecutionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutcomeRecord {
            success: self.success(),
            command: &self.command,
            message: &self.message,
            error: self.error.as_ref(),
            content: self.content.as_ref(),
            cursor: self.cursor,
            selection: self.selection,
        }
        .serialize(serializer)
    }
}

/// Applies `command` to `state`.
///
/// Bounds are checked against the content length of `state` itself.
pub fn execute(command: &Command, state: &BufferState) -> ExecutionOutcome {
    let result = match command {
        Command::Move { position } => move_to(state, *position),
        Command::Select { start, end } => select(state, *start, *end),
        Command::Insert { text } => insert(state, text),
        Command::Delete => delete(state),
    };

    match result {
        Ok(outcome) => {
            tracing::debug!("{} -> {}", command, outcome.message);
            outcome
        }
        Err(err) => {
            tracing::debug!("{} failed: {}", command, err);
            ExecutionOutcome::failure(Some(command.clone()), err)
        }
    }
}

fn move_to(state: &BufferState, position: usize) -> Result<ExecutionOutcome, CommandError> {
    let len = state.len();
    if position > len {
        return Err(CommandError::PositionOutOfRange { position, len });
    }

    Ok(ExecutionOutcome {
        command: Some(Command::Move { position }),
        message: format!("Moved cursor to {position}"),
        error: None,
        content: None,
        cursor: Some(position),
        selection: Some(Selection::caret(position)),
    })
}

/// Only the selection changes; the caret stays where it was.
fn select(state: &BufferState, start: usize, end: usize) -> Result<ExecutionOutcome, CommandError> {
    let len = state.len();
    if start > end || end > len {
        return Err(CommandError::InvalidRange { start, end, len });
    }

    Ok(ExecutionOutcome {
        command: Some(Command::Select { start, end }),
        message: format!("Selected {start}-{end}"),
        error: None,
        content: None,
        cursor: None,
        selection: Some(Selection { start, end }),
    })
}

fn insert(state: &BufferState, text: &str) -> Result<ExecutionOutcome, CommandError> {
    let selection = state.selection();
    let inserted = text.chars().count();
    let mut content = state.content().clone();

    let (at, message) = if selection.is_caret() {
        let at = state.cursor();
        content.insert(at, text)?;
        (at, format!("Inserted {inserted} chars at {at}"))
    } else {
        content.replace(selection.range(), text)?;
        (
            selection.start,
            format!("Replaced {selection} with {inserted} chars"),
        )
    };

    let cursor = at + inserted;
    Ok(ExecutionOutcome {
        command: Some(Command::Insert {
            text: text.to_string(),
        }),
        message,
        error: None,
        content: Some(content),
        cursor: Some(cursor),
        selection: Some(Selection::caret(cursor)),
    })
}

fn delete(state: &BufferState) -> Result<ExecutionOutcome, CommandError> {
    let selection = state.selection();
    let mut content = state.content().clone();

    let (cursor, message) = if !selection.is_caret() {
        content.delete(selection.range())?;
        (selection.start, format!("Deleted {selection}"))
    } else if state.cursor() > 0 {
        let at = state.cursor() - 1;
        content.delete(at..at + 1)?;
        (at, format!("Deleted character at {at}"))
    } else {
        return Err(CommandError::NothingToDelete);
    };

    Ok(ExecutionOutcome {
        command: Some(Command::Delete),
        message,
        error: None,
        content: Some(content),
        cursor: Some(cursor),
        selection: Some(Selection::caret(cursor)),
    })
}
