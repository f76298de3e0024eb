//! How requests reach the assistant.
//!
//! The interpreter treats the assistant as an opaque request/reply pair.
//! [`ProcessTransport`] hands the request to an external program the way
//! a language server is driven: spawn it, write JSON to stdin, read JSON
//! from stdout. [`ScriptedTransport`] answers from a fixed list, which is
//! what offline replays use.

use std::collections::VecDeque;
use std::future::Future;
use std::process::Stdio;
use std::sync::Mutex;

use scrivener_core::AssistConfig;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::message::{AssistReply, AssistRequest};
use crate::AssistError;

/// Delivers a request and returns the assistant's reply.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: &AssistRequest,
    ) -> impl Future<Output = Result<AssistReply, AssistError>> + Send;
}

/// Runs an external program per request.
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    command: String,
    args: Vec<String>,
}

impl ProcessTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Builds a transport from `[assist]` settings.
    pub fn from_config(config: &AssistConfig) -> Result<Self, AssistError> {
        let command = config.command.clone().ok_or(AssistError::NotConfigured)?;
        Ok(Self::new(command, config.args.clone()))
    }
}

impl Transport for ProcessTransport {
    async fn send(&self, request: &AssistRequest) -> Result<AssistReply, AssistError> {
        let payload = serde_json::to_vec(request)?;

        tracing::debug!("Spawning assistant: {} {:?}", self.command, self.args);
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A cancelled request must not leave the program running.
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AssistError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AssistError::Communication("stdin not captured".to_string()))?;
        stdin.write_all(&payload).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssistError::Communication(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Answers requests from a queue of canned replies.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<AssistReply>>,
    requests: Mutex<Vec<AssistRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = AssistReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<AssistRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &AssistRequest) -> Result<AssistReply, AssistError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.replies
            .lock()
            .map_err(|_| AssistError::Communication("reply queue poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| AssistError::Communication("no scripted reply left".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChatMessage;

    fn request() -> AssistRequest {
        AssistRequest {
            messages: vec![ChatMessage::user("hi")],
        }
    }

    #[tokio::test]
    async fn test_scripted_transport_replays_in_order() {
        let transport = ScriptedTransport::new([AssistReply::ok("MOVE 1"), AssistReply::failed("nope")]);

        assert_eq!(transport.send(&request()).await.unwrap(), AssistReply::ok("MOVE 1"));
        assert_eq!(transport.send(&request()).await.unwrap(), AssistReply::failed("nope"));
        assert!(matches!(
            transport.send(&request()).await,
            Err(AssistError::Communication(_))
        ));
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_from_config_requires_command() {
        let config = AssistConfig::default();
        assert!(matches!(
            ProcessTransport::from_config(&config),
            Err(AssistError::NotConfigured)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_transport_round_trip() {
        let transport = ProcessTransport::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"cat > /dev/null; printf '{"success":true,"text":"DELETE"}'"#.to_string(),
            ],
        );
        let reply = transport.send(&request()).await.unwrap();
        assert_eq!(reply, AssistReply::ok("DELETE"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_transport_nonzero_exit() {
        let transport = ProcessTransport::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; echo boom >&2; exit 3".to_string()],
        );
        match transport.send(&request()).await {
            Err(AssistError::Communication(msg)) => assert!(msg.contains("boom")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_transport_missing_program() {
        let transport = ProcessTransport::new("scrivener-no-such-program", vec![]);
        assert!(matches!(
            transport.send(&request()).await,
            Err(AssistError::Spawn { .. })
        ));
    }
}
