//! LLM provider module for workoutplan
//!
//! Provides the provider seam, the retrying client and error classification.

use std::sync::Arc;

use tracing::debug;

pub mod classify;
mod client;
mod error;
mod openai;
pub mod provider;
mod types;

pub use classify::{AttemptOutcome, to_generation_error};
pub use client::{ClientOptions, GenerationAttempt, ModelClient, RetryPolicy};
pub use error::{CallFailure, ProviderFailure, SetupError};
pub use openai::OpenAiProvider;
pub use provider::ChatProvider;
pub use types::{ChatMessage, ChatRequest, ProviderReply, ResponseFormat, Role, TokenUsage};

use crate::config::LlmConfig;

/// Create a chat provider based on the provider specified in config
///
/// Supports "openai" and "openai-compatible" providers.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ChatProvider>, SetupError> {
    debug!(provider = %config.provider, model = %config.model, "create_provider: called");
    match config.provider.as_str() {
        "openai" | "openai-compatible" => {
            debug!("create_provider: creating OpenAI provider");
            Ok(Arc::new(OpenAiProvider::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_provider: unknown provider");
            Err(SetupError::UnknownProvider(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            ..LlmConfig::default()
        };
        match create_provider(&config) {
            Err(SetupError::UnknownProvider(name)) => assert_eq!(name, "anthropic"),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_openai_compatible_allows_missing_key() {
        let config = LlmConfig {
            provider: "openai-compatible".to_string(),
            api_key_env: "WORKOUTPLAN_TEST_UNSET_KEY_VAR".to_string(),
            base_url: "http://localhost:11434".to_string(),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai-compatible");
    }

    #[test]
    fn test_openai_requires_key() {
        let config = LlmConfig {
            api_key_env: "WORKOUTPLAN_TEST_UNSET_KEY_VAR".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(create_provider(&config), Err(SetupError::MissingApiKey(_))));
    }
}
