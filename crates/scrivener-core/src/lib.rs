//! # Scrivener Core
//!
//! The command interpreter and the session that commits its results.
//!
//! ## Architecture Overview
//!
//! ```text
//!  raw line ──▶ parser ──▶ Command ──▶ executor ──▶ ExecutionOutcome
//!                                          ▲              │
//!                                          │   apply_to   ▼
//!                                     BufferState ◀───────┘
//!
//!  CommandQueue ──▶ run_sequence (fold, no commit) ──▶ SequenceRun
//!                                                         │
//!  Session ◀────────────── single commit ◀────────────────┘
//!     │
//!     └──▶ render_context ──▶ context block for the assistant
//! ```
//!
//! Parser, executor, runner and renderer are pure functions. `Session` is
//! the only stateful piece.

pub mod command;
pub mod config;
pub mod event;
pub mod executor;
pub mod log;
pub mod parser;
pub mod render;
pub mod sequence;
pub mod session;

pub use command::{Command, CommandError};
pub use config::{AssistConfig, Config, ConfigError, RenderConfig};
pub use event::{EventBus, EventHandler, SessionEvent};
pub use executor::{ExecutionOutcome, execute};
pub use log::{ActivityLog, EntryKind, LogEntry};
pub use parser::parse;
pub use render::render_context;
pub use sequence::{CommandLine, CommandQueue, LineId, SequenceRun, TraceEntry, run_sequence};
pub use session::Session;

pub use scrivener_buffer::{BufferState, Position, Selection, TextBuffer};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in session operations.
///
/// Command failures are not here: they are reported through
/// [`ExecutionOutcome`] and never abort anything.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Command line not found: {0}")]
    LineNotFound(LineId),

    #[error("Buffer error: {0}")]
    Buffer(#[from] scrivener_buffer::BufferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
