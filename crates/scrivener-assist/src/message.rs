//! Wire types exchanged with the assistant.
//!
//! ```json
//! // request
//! {"messages": [{"role": "system", "content": "..."},
//!               {"role": "user", "content": "..."}]}
//!
//! // reply
//! {"success": true, "text": "MOVE 0\nINSERT hi"}
//! {"success": false, "error": "rate limited"}
//! ```

use serde::{Deserialize, Serialize};

use crate::AssistError;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A request: the full message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistRequest {
    pub messages: Vec<ChatMessage>,
}

/// The assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssistReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.into()),
        }
    }

    /// Returns the reply text, or the failure as an error.
    pub fn into_text(self) -> Result<String, AssistError> {
        if self.success {
            Ok(self.text.unwrap_or_default())
        } else {
            Err(AssistError::Rejected(
                self.error
                    .unwrap_or_else(|| "assistant reported failure".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = AssistRequest {
            messages: vec![ChatMessage::system("rules"), ChatMessage::user("do it")],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"messages":[{"role":"system","content":"rules"},{"role":"user","content":"do it"}]}"#
        );
    }

    #[test]
    fn test_reply_parsing() {
        let reply: AssistReply = serde_json::from_str(r#"{"success":true,"text":"DELETE"}"#).unwrap();
        assert_eq!(reply.into_text().unwrap(), "DELETE");

        let reply: AssistReply = serde_json::from_str(r#"{"success":false,"error":"quota"}"#).unwrap();
        assert!(matches!(reply.into_text(), Err(AssistError::Rejected(msg)) if msg == "quota"));

        let reply: AssistReply = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(matches!(reply.into_text(), Err(AssistError::Rejected(_))));
    }
}
