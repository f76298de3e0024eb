//! # Scrivener Assist
//!
//! The round-trip to the external assistant that turns instructions into
//! command lines.
//!
//! ```text
//! Session::context() + instruction
//!        │ build_request
//!        ▼
//! AssistRequest ──▶ Transport ──▶ AssistReply {success, text | error}
//!                                        │ extract_commands
//!                                        ▼
//!                         Vec<String> ──▶ Session::accept_reply
//! ```
//!
//! Nothing here touches the buffer. A failed request is reported once
//! through [`Session::record_assist_failure`](scrivener_core::Session::record_assist_failure)
//! and the queue stays as it was.

mod client;
mod message;
mod prompt;
mod transport;

pub use client::{Assistant, RequestHandle, RequestId, RequestSlot};
pub use message::{AssistReply, AssistRequest, ChatMessage, Role};
pub use prompt::{SYSTEM_PROMPT, build_request, extract_commands};
pub use transport::{ProcessTransport, ScriptedTransport, Transport};

use std::time::Duration;

/// Assistant request errors.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("An assistant request is already in flight")]
    Busy,

    #[error("No assistant command configured")]
    NotConfigured,

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Assistant reported failure: {0}")]
    Rejected(String),

    #[error("Timed out after {0:?} waiting for the assistant")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
