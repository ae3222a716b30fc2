//! Generation error taxonomy
//!
//! Every failure the pipeline can surface is one of these variants. Callers
//! branch on the variant, never on the message text.

use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Errors returned by plan generation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The incoming preferences are missing a field or carry an invalid value
    #[error("Invalid request field '{field}': {message}")]
    InvalidRequest { field: String, message: String },

    /// The provider could not produce a reply (timeouts, 5xx, other upstream rejections)
    #[error("Provider unavailable{}: {message}", status_suffix(.status))]
    ProviderUnavailable { message: String, status: Option<u16> },

    /// The provider kept answering 429 until retries ran out
    #[error("Provider rate limited: {message}")]
    ProviderRateLimited { message: String },

    /// The provider rejected our credentials (401/403)
    #[error("Provider authentication failed ({status}): {message}")]
    ProviderAuthFailed { message: String, status: u16 },

    /// The provider reply was not parseable JSON, or carried no content at all
    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String },

    /// The reply parsed as JSON but does not match the workout plan shape
    #[error("Schema violation at {path}: {message}")]
    SchemaViolation { path: String, message: String },

    /// An operator-supplied prompt template failed to render
    #[error("Prompt template error: {message}")]
    PromptTemplate { message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl GenerationError {
    /// Shorthand for an invalid-request error naming `field`
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a schema violation at `path`
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Stable, machine-friendly name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
            Self::ProviderRateLimited { .. } => "provider_rate_limited",
            Self::ProviderAuthFailed { .. } => "provider_auth_failed",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::SchemaViolation { .. } => "schema_violation",
            Self::PromptTemplate { .. } => "prompt_template",
        }
    }

    /// Upstream HTTP status observed for this failure, if any
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::ProviderUnavailable { status, .. } => *status,
            Self::ProviderRateLimited { .. } => Some(429),
            Self::ProviderAuthFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// HTTP status an inbound API should answer with
    pub fn http_status(&self) -> u16 {
        let code = match self {
            Self::InvalidRequest { .. } => 400,
            Self::ProviderRateLimited { .. } => 429,
            Self::ProviderAuthFailed { .. } => 500,
            Self::ProviderUnavailable { status, .. } => match status {
                None | Some(503) => 503,
                Some(_) => 502,
            },
            Self::MalformedResponse { .. } | Self::SchemaViolation { .. } => 502,
            Self::PromptTemplate { .. } => 500,
        };
        debug!(kind = self.kind(), code, "http_status: called");
        code
    }

    /// Message that is safe to show to the caller
    ///
    /// Configuration and upstream-contract details stay in the server log.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest { field, message } => format!("Invalid '{}': {}", field, message),
            Self::ProviderRateLimited { .. } => {
                "The plan generator is receiving too many requests. Please retry later.".to_string()
            }
            Self::ProviderUnavailable { .. } => {
                "The plan generator is temporarily unavailable. Please try again later.".to_string()
            }
            Self::ProviderAuthFailed { .. } | Self::PromptTemplate { .. } => "Internal server error".to_string(),
            Self::MalformedResponse { .. } | Self::SchemaViolation { .. } => "Failed to generate plan".to_string(),
        }
    }

    /// JSON error body for an inbound API response
    pub fn response_body(&self) -> serde_json::Value {
        json!({
            "error": self.public_message(),
            "status": self.http_status(),
        })
    }

    /// Whether the caller may reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable { .. } | Self::ProviderRateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(GenerationError::invalid("fitnessGoal", "missing").http_status(), 400);
        assert_eq!(
            GenerationError::ProviderRateLimited {
                message: "429".to_string()
            }
            .http_status(),
            429
        );
        assert_eq!(
            GenerationError::ProviderAuthFailed {
                message: "bad key".to_string(),
                status: 401
            }
            .http_status(),
            500
        );
        assert_eq!(
            GenerationError::MalformedResponse {
                message: "eof".to_string()
            }
            .http_status(),
            502
        );
        assert_eq!(GenerationError::schema("schedule", "missing").http_status(), 502);
    }

    #[test]
    fn test_unavailable_status_depends_on_upstream() {
        let timeout = GenerationError::ProviderUnavailable {
            message: "timed out".to_string(),
            status: None,
        };
        assert_eq!(timeout.http_status(), 503);

        let overloaded = GenerationError::ProviderUnavailable {
            message: "overloaded".to_string(),
            status: Some(503),
        };
        assert_eq!(overloaded.http_status(), 503);

        let bad_gateway = GenerationError::ProviderUnavailable {
            message: "boom".to_string(),
            status: Some(500),
        };
        assert_eq!(bad_gateway.http_status(), 502);
    }

    #[test]
    fn test_public_message_hides_details() {
        let err = GenerationError::ProviderAuthFailed {
            message: "invalid api key sk-123".to_string(),
            status: 401,
        };
        assert!(!err.public_message().contains("sk-123"));
        assert!(err.to_string().contains("sk-123"));

        let err = GenerationError::schema("schedule[0].days[2].exercises", "expected array");
        assert_eq!(err.public_message(), "Failed to generate plan");
    }

    #[test]
    fn test_invalid_request_names_field() {
        let err = GenerationError::invalid("workoutDaysPerWeek", "field is required");
        assert!(err.public_message().contains("workoutDaysPerWeek"));
        assert_eq!(err.kind(), "invalid_request");
    }

    #[test]
    fn test_response_body() {
        let body = GenerationError::ProviderRateLimited {
            message: "slow down".to_string(),
        }
        .response_body();
        assert_eq!(body["status"], 429);
        assert!(body["error"].as_str().unwrap().contains("retry later"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(
            GenerationError::ProviderUnavailable {
                message: "x".to_string(),
                status: Some(502)
            }
            .is_retryable()
        );
        assert!(!GenerationError::invalid("x", "y").is_retryable());
    }
}
