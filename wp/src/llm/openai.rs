//! OpenAI API provider implementation
//!
//! Implements the ChatProvider trait for OpenAI's Chat Completions API and
//! any server that speaks the same wire format.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use tracing::debug;

use super::{ChatProvider, ChatRequest, ProviderFailure, ProviderReply, SetupError, TokenUsage};
use crate::config::LlmConfig;

/// Connection establishment bound; the whole attempt is bounded by the caller
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    name: String,
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenAiProvider {
    /// Create a provider with an explicit key and base URL
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SetupError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, "OpenAiProvider::new: called");
        Ok(Self {
            name: name.into(),
            api_key: api_key.into(),
            base_url,
            http,
        })
    }

    /// Create a provider from configuration, resolving the key from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Self, SetupError> {
        debug!(provider = %config.provider, model = %config.model, "from_config: called");
        let api_key = config.get_api_key()?;
        Self::new(config.provider.clone(), api_key, config.base_url.clone())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        debug!(model = %request.model, %request.max_tokens, "build_request_body: called");

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            request.model.starts_with("gpt-5") || request.model.starts_with("o1") || request.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "response_format": { "type": request.response_format.as_str() },
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(request.max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(request.max_tokens);
        }

        body
    }

    /// Turn a successful response body into a reply
    fn parse_success(status: u16, text: &str) -> ProviderReply {
        let api_response: OpenAiResponse = match serde_json::from_str(text) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "parse_success: body is not a chat completion");
                return ProviderReply {
                    status,
                    content: None,
                    detail: Some(format!("Unreadable completion body: {}", e)),
                    retry_after: None,
                    usage: None,
                };
            }
        };

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        ProviderReply {
            status,
            content,
            detail: None,
            retry_after: None,
            usage: api_response.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        }
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw text
fn error_detail(text: &str) -> String {
    serde_json::from_str::<OpenAiErrorBody>(text)
        .ok()
        .map(|body| body.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Parse a `Retry-After` header given in whole seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, request: &ChatRequest) -> Result<ProviderReply, ProviderFailure> {
        debug!(model = %request.model, "send: called");
        let body = self.build_request_body(request);

        let mut builder = self
            .http
            .post(self.endpoint())
            .header("content-type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            debug!(error = %e, "send: network error");
            ProviderFailure::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let retry_after = retry_after(response.headers());

        if !(200..300).contains(&status) {
            debug!(status, "send: API error");
            // The status alone decides classification, so a lost body only loses the detail
            let detail = match response.text().await {
                Ok(text) => error_detail(&text),
                Err(e) => {
                    debug!(status, error = %e, "send: error body unreadable");
                    format!("HTTP {} (unreadable body: {})", status, e)
                }
            };
            let mut reply = ProviderReply::status(status, detail);
            reply.retry_after = retry_after;
            return Ok(reply);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ProviderFailure::Network(format!("Failed to read response body: {}", e)))?;

        debug!(status, "send: success");
        Ok(Self::parse_success(status, &text))
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    #[serde(default)]
    message: String,
}
