//! Sending instructions and tracking the request in flight.
//!
//! ## Owned requests
//!
//! An in-flight request is a [`RequestHandle`] held by whoever sent it.
//! Dropping the handle detaches the task; [`RequestHandle::cancel`] aborts
//! it (and, for [`ProcessTransport`](crate::ProcessTransport), kills the
//! child). [`RequestSlot`] holds at most one handle and refuses a second
//! instruction while the first is still running. Direct command execution
//! on the session never goes through the slot, so it's never blocked.

use std::sync::Arc;
use std::time::Duration;

use scrivener_core::{AssistConfig, Session};
use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

use crate::message::AssistRequest;
use crate::prompt::{SYSTEM_PROMPT, build_request, extract_commands};
use crate::transport::Transport;
use crate::AssistError;

/// Identifies one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sends instructions through a transport.
pub struct Assistant<T> {
    transport: Arc<T>,
    timeout: Duration,
    system_prompt: String,
    strip_code_fences: bool,
}

impl<T: Transport> Assistant<T> {
    /// Creates an assistant using `[assist]` settings.
    pub fn new(transport: T, config: &AssistConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            timeout: Duration::from_secs(config.timeout_secs),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
            strip_code_fences: config.strip_code_fences,
        }
    }

    /// The transport requests go through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the request for `instruction` against the session's state.
    pub fn request_for(&self, session: &Session, instruction: &str) -> AssistRequest {
        build_request(&self.system_prompt, &session.context(), instruction)
    }

    /// Records the instruction on the session and sends it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn ask(&self, session: &mut Session, instruction: &str) -> RequestHandle {
        session.record_instruction(instruction);
        self.send(self.request_for(session, instruction))
    }

    /// Sends a prepared request on a background task.
    pub fn send(&self, request: AssistRequest) -> RequestHandle {
        let id = RequestId::new();
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;
        let strip = self.strip_code_fences;

        tracing::info!("Sending assistant request {}", id);
        let task = tokio::spawn(async move {
            let reply = tokio::time::timeout(timeout, transport.send(&request))
                .await
                .map_err(|_| AssistError::Timeout(timeout))??;
            let text = reply.into_text()?;
            Ok::<_, AssistError>(extract_commands(&text, strip))
        });

        RequestHandle { id, task }
    }
}

/// A request in flight.
pub struct RequestHandle {
    id: RequestId,
    task: JoinHandle<Result<Vec<String>, AssistError>>,
}

impl RequestHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns true once the request has completed, failed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Aborts the request. Waiting on it afterwards yields `Cancelled`.
    pub fn cancel(&self) {
        tracing::debug!("Cancelling assistant request {}", self.id);
        self.task.abort();
    }

    /// A detached handle that can abort the request while `wait` runs.
    pub fn canceller(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    /// Waits for the command lines the assistant sent back.
    pub async fn wait(self) -> Result<Vec<String>, AssistError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(AssistError::Cancelled),
            Err(err) => Err(AssistError::Communication(err.to_string())),
        }
    }
}

/// Holds at most one in-flight request.
#[derive(Default)]
pub struct RequestSlot {
    current: Option<RequestHandle>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a request is still running.
    pub fn is_busy(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Starts a request unless one is already running.
    ///
    /// `start` is only called when the slot is free. A finished but
    /// uncollected request is discarded.
    pub fn start(
        &mut self,
        start: impl FnOnce() -> RequestHandle,
    ) -> Result<RequestId, AssistError> {
        if self.is_busy() {
            return Err(AssistError::Busy);
        }
        if self.current.is_some() {
            tracing::warn!("Discarding uncollected assistant reply");
        }

        let handle = start();
        let id = handle.id();
        self.current = Some(handle);
        Ok(id)
    }

    /// Waits for the current request; `None` if the slot is empty.
    pub async fn wait(&mut self) -> Option<Result<Vec<String>, AssistError>> {
        let handle = self.current.take()?;
        Some(handle.wait().await)
    }

    /// Cancels the current request, if any.
    pub fn cancel(&mut self) -> bool {
        match &self.current {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Takes the handle out of the slot.
    pub fn take(&mut self) -> Option<RequestHandle> {
        self.current.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AssistReply, Role};
    use crate::transport::ScriptedTransport;
    use std::future::Future;

    /// Never answers.
    struct Silent;

    impl Transport for Silent {
        fn send(
            &self,
            _request: &AssistRequest,
        ) -> impl Future<Output = Result<AssistReply, AssistError>> + Send {
            std::future::pending()
        }
    }

    fn config(timeout_secs: u64) -> AssistConfig {
        AssistConfig {
            timeout_secs,
            ..AssistConfig::default()
        }
    }

    #[tokio::test]
    async fn test_ask_round_trip() {
        let transport = ScriptedTransport::new([AssistReply::ok("```\nMOVE 0\nINSERT \"hi \"\n```")]);
        let assistant = Assistant::new(transport, &config(5));
        let mut session = Session::new("there");

        let lines = assistant.ask(&mut session, "greet").wait().await.unwrap();
        assert_eq!(lines, vec!["MOVE 0", "INSERT \"hi \""]);

        let sent = assistant.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].messages[0].role, Role::System);
        assert!(sent[0].messages[1].content.contains("   1 | there"));
        assert!(sent[0].messages[1].content.ends_with("Instruction: greet"));

        session.accept_reply(lines);
        session.run_pending();
        assert_eq!(session.state().content().text(), "hi there");
    }

    #[tokio::test]
    async fn test_rejected_reply() {
        let transport = ScriptedTransport::new([AssistReply::failed("quota exceeded")]);
        let assistant = Assistant::new(transport, &config(5));
        let request = assistant.request_for(&Session::default(), "x");

        let err = assistant.send(request).wait().await.unwrap_err();
        assert!(matches!(err, AssistError::Rejected(msg) if msg == "quota exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let assistant = Assistant::new(Silent, &config(2));
        let request = assistant.request_for(&Session::default(), "x");

        let err = assistant.send(request).wait().await.unwrap_err();
        assert!(matches!(err, AssistError::Timeout(d) if d == Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_cancel() {
        let assistant = Assistant::new(Silent, &config(60));
        let handle = assistant.send(assistant.request_for(&Session::default(), "x"));

        handle.cancel();
        assert!(matches!(handle.wait().await, Err(AssistError::Cancelled)));
    }

    #[tokio::test]
    async fn test_canceller_aborts_pending_wait() {
        let assistant = Assistant::new(Silent, &config(60));
        let handle = assistant.send(assistant.request_for(&Session::default(), "x"));
        let canceller = handle.canceller();

        let waiter = tokio::spawn(handle.wait());
        canceller.abort();
        assert!(matches!(waiter.await.unwrap(), Err(AssistError::Cancelled)));
    }

    #[tokio::test]
    async fn test_slot_rejects_overlapping_requests() {
        let assistant = Assistant::new(Silent, &config(60));
        let session = Session::default();
        let mut slot = RequestSlot::new();

        slot.start(|| assistant.send(assistant.request_for(&session, "first")))
            .unwrap();
        assert!(slot.is_busy());

        let second = slot.start(|| assistant.send(assistant.request_for(&session, "second")));
        assert!(matches!(second, Err(AssistError::Busy)));

        assert!(slot.cancel());
        assert!(matches!(slot.wait().await, Some(Err(AssistError::Cancelled))));
        assert!(!slot.is_busy());
        assert!(slot.wait().await.is_none());
    }

    #[tokio::test]
    async fn test_direct_execution_not_blocked_by_request() {
        let assistant = Assistant::new(Silent, &config(60));
        let mut session = Session::new("abc");
        let mut slot = RequestSlot::new();

        slot.start(|| assistant.ask(&mut session, "slow")).unwrap();
        let outcome = session.execute_text("MOVE 3");
        assert!(outcome.success());
        assert_eq!(session.state().cursor(), 3);
        slot.cancel();
    }
}
