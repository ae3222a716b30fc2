//! ChatProvider trait definition

use async_trait::async_trait;

use super::{ChatRequest, ProviderFailure, ProviderReply};

/// One chat-completion exchange with an LLM provider
///
/// Implementations send exactly one HTTP request per call and never retry;
/// retry, timeout and classification belong to [`super::ModelClient`].
/// Dropping the returned future must abort the in-flight request.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Send one request and return whatever the server answered
    ///
    /// Non-success HTTP statuses are returned as an `Ok` reply; only failures
    /// that never reached a response (connect errors, timeouts, broken
    /// bodies) are `Err`.
    async fn send(&self, request: &ChatRequest) -> Result<ProviderReply, ProviderFailure>;
}
