//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Why a single provider attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {status}: {message}")]
    Http {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Provider reply had no message content")]
    EmptyContent,
}

impl ProviderFailure {
    /// HTTP status, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderFailure::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        self.status() == Some(429)
    }

    /// Check if the provider rejected our credentials
    pub fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Get the server-requested retry delay, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderFailure::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Outcome of a full retrying call that did not produce text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    /// Every attempt failed transiently; carries the last failure
    #[error("Gave up after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: ProviderFailure },

    /// An attempt failed in a way retrying cannot fix
    #[error("Fatal failure on attempt {attempt}: {failure}")]
    Fatal { attempt: u32, failure: ProviderFailure },
}

impl CallFailure {
    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            CallFailure::Exhausted { attempts, .. } => *attempts,
            CallFailure::Fatal { attempt, .. } => *attempt,
        }
    }

    /// The failure that ended the call
    pub fn failure(&self) -> &ProviderFailure {
        match self {
            CallFailure::Exhausted { last, .. } => last,
            CallFailure::Fatal { failure, .. } => failure,
        }
    }
}

/// Errors building a provider from configuration
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("LLM API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Unknown LLM provider: '{0}'. Supported: openai, openai-compatible")]
    UnknownProvider(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ProviderFailure {
        ProviderFailure::Http {
            status,
            message: "err".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn test_is_rate_limit() {
        assert!(http(429).is_rate_limit());
        assert!(!http(500).is_rate_limit());
        assert!(!ProviderFailure::Timeout(Duration::from_secs(1)).is_rate_limit());
    }

    #[test]
    fn test_is_auth() {
        assert!(http(401).is_auth());
        assert!(http(403).is_auth());
        assert!(!http(404).is_auth());
        assert!(!ProviderFailure::EmptyContent.is_auth());
    }

    #[test]
    fn test_retry_after() {
        let err = ProviderFailure::Http {
            status: 429,
            message: "slow".to_string(),
            retry_after: Some(Duration::from_secs(42)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(http(500).retry_after(), None);
    }

    #[test]
    fn test_call_failure_accessors() {
        let failure = CallFailure::Exhausted {
            attempts: 3,
            last: http(503),
        };
        assert_eq!(failure.attempts(), 3);
        assert_eq!(failure.failure().status(), Some(503));
        assert!(failure.to_string().contains("3 attempt"));
    }
}
