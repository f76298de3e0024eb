//! Session orchestration.
//!
//! `Session` is the facade hosts talk to. It owns the one live
//! `BufferState`, the command queue and the activity log, and it is the
//! only place where results of the pure interpreter get committed.
//!
//! ## Thread Safety
//!
//! A session is owned by a single task. Every method that runs commands
//! takes `&mut self`, so two runs against the same state cannot overlap.
//! The assistant round-trip happens outside the session; only its reply
//! is fed back in.

use scrivener_buffer::{BufferState, Selection, TextBuffer};

use crate::config::Config;
use crate::event::{EventBus, SessionEvent};
use crate::executor::ExecutionOutcome;
use crate::log::{ActivityLog, EntryKind};
use crate::render::render_context;
use crate::sequence::{CommandLine, CommandQueue, LineId, TraceEntry, run_sequence};
use crate::{CoreError, CoreResult};

/// One editing session over one buffer.
pub struct Session {
    /// Live buffer state
    state: BufferState,

    /// Queued command lines
    queue: CommandQueue,

    /// User-facing history
    log: ActivityLog,

    /// Configuration
    config: Config,

    /// Event bus for notifications
    event_bus: EventBus,
}

impl Session {
    /// Creates a session over `content` with default configuration.
    pub fn new(content: impl Into<TextBuffer>) -> Self {
        Self::with_config(content, Config::default())
    }

    /// Creates a session with custom configuration.
    pub fn with_config(content: impl Into<TextBuffer>, config: Config) -> Self {
        Self {
            state: BufferState::new(content.into()),
            queue: CommandQueue::new(),
            log: ActivityLog::new(config.session.log_capacity),
            config,
            event_bus: EventBus::new(),
        }
    }

    // ==================== Buffer ====================

    /// The live buffer state.
    pub fn state(&self) -> &BufferState {
        &self.state
    }

    /// Replaces the live state, e.g. after the user typed in the host.
    pub fn set_state(&mut self, state: BufferState) {
        self.state = state;
        self.emit(SessionEvent::BufferChanged);
    }

    /// Moves the live caret, clearing any selection.
    pub fn set_cursor(&mut self, cursor: usize) -> CoreResult<()> {
        let state = self.state.with_cursor(cursor)?;
        self.set_state(state);
        Ok(())
    }

    /// Sets the live selection, keeping the caret.
    pub fn set_selection(&mut self, selection: Selection) -> CoreResult<()> {
        let state = self.state.with_selection(selection)?;
        self.set_state(state);
        Ok(())
    }

    /// Renders the live state for the assistant.
    pub fn context(&self) -> String {
        render_context(&self.state, &self.config.render)
    }

    // ==================== Queue ====================

    /// The command queue.
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Queues one command line.
    pub fn enqueue(&mut self, text: impl Into<String>) -> LineId {
        let id = self.queue.push(text);
        self.emit(SessionEvent::QueueChanged);
        id
    }

    /// Changes a queued line's text; it becomes pending again.
    pub fn edit_line(&mut self, id: LineId, text: impl Into<String>) -> CoreResult<()> {
        if !self.queue.edit(id, text) {
            return Err(CoreError::LineNotFound(id));
        }
        self.emit(SessionEvent::QueueChanged);
        Ok(())
    }

    /// Replaces a queued line with a new one, returning the new ID.
    pub fn replace_line(&mut self, id: LineId, text: impl Into<String>) -> CoreResult<LineId> {
        let new_id = self
            .queue
            .replace(id, text)
            .ok_or(CoreError::LineNotFound(id))?;
        self.emit(SessionEvent::QueueChanged);
        Ok(new_id)
    }

    // ==================== Execution ====================

    /// Runs one queued line against the live state and commits at once.
    ///
    /// Already-executed lines may be run again.
    pub fn execute_line(&mut self, id: LineId) -> CoreResult<ExecutionOutcome> {
        let line = self.queue.get(id).ok_or(CoreError::LineNotFound(id))?;
        let text = line.text().to_string();
        let outcome = line.run(&self.state);

        self.queue.mark_executed([id]);
        self.commit_step(&text, &outcome);
        self.emit(SessionEvent::CommandExecuted {
            line: id,
            success: outcome.success(),
        });
        self.emit(SessionEvent::QueueChanged);
        Ok(outcome)
    }

    /// Runs a command that is not in the queue.
    pub fn execute_text(&mut self, text: &str) -> ExecutionOutcome {
        let outcome = CommandLine::new(text).run(&self.state);
        self.commit_step(text, &outcome);
        outcome
    }

    /// Runs every pending line as one sequence and commits once.
    ///
    /// Returns the trace, one entry per attempted line.
    pub fn run_pending(&mut self) -> Vec<TraceEntry> {
        let pending: Vec<CommandLine> = self.queue.pending().cloned().collect();
        if pending.is_empty() {
            return Vec::new();
        }

        let run = run_sequence(&pending, &self.state);
        let attempted = run.trace.len();
        let failed = run.failures();

        // commit
        self.queue.mark_executed(run.attempted());
        let changed = run.final_state != self.state;
        self.state = run.final_state;
        for entry in &run.trace {
            self.log_outcome(&entry.text, &entry.outcome);
        }

        tracing::info!("Committed sequence: {} lines, {} failed", attempted, failed);
        if changed {
            self.emit(SessionEvent::BufferChanged);
        }
        self.emit(SessionEvent::QueueChanged);
        self.emit(SessionEvent::SequenceCommitted { attempted, failed });

        run.trace
    }

    fn commit_step(&mut self, text: &str, outcome: &ExecutionOutcome) {
        let next = outcome.apply_to(&self.state);
        self.log_outcome(text, outcome);
        if next != self.state {
            self.set_state(next);
        }
    }

    fn log_outcome(&mut self, text: &str, outcome: &ExecutionOutcome) {
        self.log.push(
            EntryKind::Command,
            outcome.success(),
            format!("{}: {}", text.trim(), outcome.message),
        );
    }

    // ==================== Assistant round-trip ====================

    /// Records an instruction about to be sent to the assistant.
    pub fn record_instruction(&mut self, instruction: &str) {
        self.log.push(EntryKind::Instruction, true, instruction);
    }

    /// Queues the command lines the assistant sent back.
    pub fn accept_reply<I, S>(&mut self, lines: I) -> Vec<LineId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = self.queue.extend(lines);
        self.log.push(
            EntryKind::AssistReply,
            true,
            format!("Received {} commands", ids.len()),
        );
        if !ids.is_empty() {
            self.emit(SessionEvent::QueueChanged);
        }
        ids
    }

    /// Logs a failed assistant request. Buffer and queue are left alone.
    pub fn record_assist_failure(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("Assistant request failed: {}", message);
        self.log.push(EntryKind::AssistError, false, message.clone());
        self.emit(SessionEvent::AssistFailed(message));
    }

    // ==================== Misc ====================

    /// The activity log.
    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.event_bus.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        self.event_bus.emit(event);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(TextBuffer::new())
    }
}
