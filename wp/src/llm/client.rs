//! Retrying model client
//!
//! Wraps a [`ChatProvider`] with a per-attempt timeout and exponential
//! backoff. Each attempt's result goes through [`classify`]; only transient
//! outcomes are retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::classify::{AttemptOutcome, classify};
use super::{CallFailure, ChatProvider, ChatRequest, ProviderFailure, ProviderReply, TokenUsage};
use crate::config::{LlmConfig, RetryConfig};
use crate::prompts::PromptPair;

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after that
    pub initial_backoff: Duration,

    /// Upper bound for any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(8000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after attempt number `attempt` (1-based) failed
    ///
    /// A server-provided `retry_after` replaces the computed delay. Both are
    /// capped at `max_backoff`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let computed = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        retry_after.unwrap_or(computed).min(self.max_backoff)
    }
}

/// Request shaping and limits applied to every call
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Bound on each individual attempt
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientOptions {
    pub fn from_config(llm: &LlmConfig, retry: &RetryConfig) -> Self {
        Self {
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            timeout: Duration::from_millis(llm.timeout_ms),
            retry: RetryPolicy::from(retry),
        }
    }
}

/// Record of one provider attempt
#[derive(Debug, Clone)]
pub struct GenerationAttempt {
    pub number: u32,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
    /// Token usage, when the provider reported it
    pub usage: Option<TokenUsage>,
}

impl GenerationAttempt {
    /// Classify the raw result of attempt `number`, keeping any reported usage
    pub fn record(number: u32, elapsed: Duration, result: Result<ProviderReply, ProviderFailure>) -> Self {
        let usage = result.as_ref().ok().and_then(|reply| reply.usage);
        Self {
            number,
            elapsed,
            outcome: classify(result),
            usage,
        }
    }

    fn log(&self, provider: &str, max_attempts: u32) {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        match &self.outcome {
            AttemptOutcome::Success(text) => {
                let usage = self.usage.unwrap_or_default();
                info!(
                    provider,
                    attempt = self.number,
                    elapsed_ms,
                    content_len = text.len(),
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "Provider attempt succeeded"
                );
            }
            AttemptOutcome::Transient(failure) => {
                warn!(
                    provider,
                    attempt = self.number,
                    max_attempts,
                    elapsed_ms,
                    error = %failure,
                    "Provider attempt failed (transient)"
                );
            }
            AttemptOutcome::Fatal(failure) => {
                warn!(
                    provider,
                    attempt = self.number,
                    elapsed_ms,
                    error = %failure,
                    "Provider attempt failed (fatal)"
                );
            }
        }
    }
}

/// Stateless client: each call is independent
pub struct ModelClient {
    provider: Arc<dyn ChatProvider>,
    options: ClientOptions,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn ChatProvider>, options: ClientOptions) -> Self {
        debug!(provider = provider.name(), ?options, "ModelClient::new: called");
        Self { provider, options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Build the provider request for a prompt pair
    pub fn build_request(&self, prompt: &PromptPair) -> ChatRequest {
        ChatRequest::from_prompt(
            prompt,
            &self.options.model,
            self.options.temperature,
            self.options.max_tokens,
        )
    }

    /// Send the prompt pair, retrying transient failures
    ///
    /// Makes at most `retry.max_attempts` attempts and never sleeps after the
    /// last one. Dropping the returned future cancels the in-flight attempt.
    pub async fn call(&self, prompt: &PromptPair) -> Result<String, CallFailure> {
        let request = self.build_request(prompt);
        let max_attempts = self.options.retry.max_attempts.max(1);
        debug!(model = %request.model, max_attempts, "call: called");

        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            let result = match tokio::time::timeout(self.options.timeout, self.provider.send(&request)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(attempt, "call: attempt timed out");
                    Err(ProviderFailure::Timeout(self.options.timeout))
                }
            };

            let record = GenerationAttempt::record(attempt, started.elapsed(), result);
            record.log(self.provider.name(), max_attempts);

            match record.outcome {
                AttemptOutcome::Success(text) => return Ok(text),
                AttemptOutcome::Fatal(failure) => return Err(CallFailure::Fatal { attempt, failure }),
                AttemptOutcome::Transient(failure) => {
                    if attempt >= max_attempts {
                        return Err(CallFailure::Exhausted {
                            attempts: attempt,
                            last: failure,
                        });
                    }
                    let delay = self.options.retry.delay_for(attempt, failure.retry_after());
                    warn!(
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        "call: retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
