//! Command queue and sequence runner.
//!
//! ## Single commit
//!
//! `run_sequence` folds the executor over the pending lines and hands
//! back the final state plus a trace. It never touches the queue or the
//! caller's state. Whoever called it commits the result once (see
//! [`Session::run_pending`](crate::Session::run_pending)), so observers
//! never see the intermediate states. Dropping the returned
//! [`SequenceRun`] is the same as never having run it.

use scrivener_buffer::BufferState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::executor::{ExecutionOutcome, execute};
use crate::parser::parse;

/// Unique identifier for a queued command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(Uuid);

impl LineId {
    /// Creates a new unique line ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A queued command in textual form.
///
/// The text is re-parsed every time the line runs, so hand edits are
/// always picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    id: LineId,
    text: String,
    executed: bool,
}

impl CommandLine {
    /// Creates a pending line.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: LineId::new(),
            text: text.into(),
            executed: false,
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Parses and executes this line against `state`.
    pub fn run(&self, state: &BufferState) -> ExecutionOutcome {
        match parse(&self.text) {
            Ok(command) => execute(&command, state),
            Err(err) => {
                tracing::debug!("Line '{}' rejected: {}", self.text, err);
                ExecutionOutcome::rejected(err)
            }
        }
    }
}

/// One step of a sequence run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub line: LineId,
    pub text: String,
    pub outcome: ExecutionOutcome,
}

/// What a sequence run produced, not yet committed anywhere.
#[derive(Debug, Clone)]
pub struct SequenceRun {
    /// State after the last line.
    pub final_state: BufferState,
    /// One entry per attempted line, in order.
    pub trace: Vec<TraceEntry>,
}

impl SequenceRun {
    /// IDs of every line that was attempted.
    pub fn attempted(&self) -> impl Iterator<Item = LineId> + '_ {
        self.trace.iter().map(|entry| entry.line)
    }

    /// Number of lines that failed to parse or apply.
    pub fn failures(&self) -> usize {
        self.trace.iter().filter(|e| !e.outcome.success()).count()
    }
}

/// Runs every pending line in order against a running copy of `state`.
///
/// A failing line leaves the running state as it was and the run carries
/// on with the next line.
pub fn run_sequence(lines: &[CommandLine], state: &BufferState) -> SequenceRun {
    let mut current = state.clone();
    let mut trace = Vec::new();

    for line in lines.iter().filter(|l| !l.executed) {
        let outcome = line.run(&current);
        current = outcome.apply_to(&current);
        trace.push(TraceEntry {
            line: line.id,
            text: line.text.clone(),
            outcome,
        });
    }

    SequenceRun {
        final_state: current,
        trace,
    }
}

/// Ordered list of command lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandQueue {
    lines: Vec<CommandLine>,
}

impl CommandQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line and returns its ID.
    pub fn push(&mut self, text: impl Into<String>) -> LineId {
        let line = CommandLine::new(text);
        let id = line.id;
        self.lines.push(line);
        id
    }

    /// Appends several lines, returning their IDs in order.
    pub fn extend<I, S>(&mut self, texts: I) -> Vec<LineId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts.into_iter().map(|t| self.push(t)).collect()
    }

    /// Changes a line's text and marks it pending again.
    ///
    /// Returns false if the line doesn't exist.
    pub fn edit(&mut self, id: LineId, text: impl Into<String>) -> bool {
        match self.get_mut(id) {
            Some(line) => {
                line.text = text.into();
                line.executed = false;
                true
            }
            None => false,
        }
    }

    /// Swaps a line for a fresh one with a new identity in the same slot.
    pub fn replace(&mut self, id: LineId, text: impl Into<String>) -> Option<LineId> {
        let slot = self.lines.iter_mut().find(|l| l.id == id)?;
        *slot = CommandLine::new(text);
        Some(slot.id)
    }

    /// Marks lines as executed.
    pub fn mark_executed(&mut self, ids: impl IntoIterator<Item = LineId>) {
        for id in ids {
            if let Some(line) = self.get_mut(id) {
                line.executed = true;
            }
        }
    }

    pub fn get(&self, id: LineId) -> Option<&CommandLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    fn get_mut(&mut self, id: LineId) -> Option<&mut CommandLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    /// All lines, executed or not.
    pub fn lines(&self) -> &[CommandLine] {
        &self.lines
    }

    /// Lines that haven't run yet.
    pub fn pending(&self) -> impl Iterator<Item = &CommandLine> {
        self.lines.iter().filter(|l| !l.executed)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
