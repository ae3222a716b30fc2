//! LLM request/response types
//!
//! Provider-agnostic shapes for one chat-completion exchange. Provider modules
//! translate these to and from their wire formats.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::prompts::PromptPair;

/// Everything needed for one provider call
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,

    /// System message followed by the user message
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature
    pub temperature: f32,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Constraint on the reply format
    pub response_format: ResponseFormat,
}

impl ChatRequest {
    /// Build a JSON-object request from a prompt pair
    pub fn from_prompt(prompt: &PromptPair, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        debug!(temperature, max_tokens, "ChatRequest::from_prompt: called");
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(&prompt.system), ChatMessage::user(&prompt.user)],
            temperature,
            max_tokens,
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Requested reply format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Exactly one JSON object
    JsonObject,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonObject => "json_object",
        }
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// What came back from one provider exchange that reached the server
///
/// Transport-level failures (timeouts, connection errors) never produce a
/// reply; they surface as [`super::ProviderFailure`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    /// HTTP status code
    pub status: u16,

    /// Generated message text, if the reply carried one
    pub content: Option<String>,

    /// Provider error detail for non-success replies
    pub detail: Option<String>,

    /// Server-requested delay before retrying
    pub retry_after: Option<Duration>,

    /// Token usage, when reported
    pub usage: Option<TokenUsage>,
}

impl ProviderReply {
    /// A successful reply carrying `content`
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            status: 200,
            content: Some(content.into()),
            detail: None,
            retry_after: None,
            usage: None,
        }
    }

    /// A reply with the given status and error detail
    pub fn status(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            content: None,
            detail: Some(detail.into()),
            retry_after: None,
            usage: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_prompt_orders_messages() {
        let prompt = PromptPair {
            system: "sys".to_string(),
            user: "usr".to_string(),
        };
        let request = ChatRequest::from_prompt(&prompt, "gpt-4o-mini", 0.7, 4096);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0], ChatMessage::system("sys"));
        assert_eq!(request.messages[1], ChatMessage::user("usr"));
        assert_eq!(request.response_format, ResponseFormat::JsonObject);
    }

    #[test]
    fn test_reply_helpers() {
        assert!(ProviderReply::ok("{}").is_success());
        let reply = ProviderReply::status(429, "slow down").with_retry_after(Duration::from_secs(2));
        assert!(!reply.is_success());
        assert_eq!(reply.retry_after, Some(Duration::from_secs(2)));
        assert!(reply.content.is_none());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert_eq!(json["role"], "system");
    }
}
