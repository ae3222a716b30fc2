//! Provider error classification
//!
//! The one place that decides which provider outcomes are worth retrying and
//! how a finished call maps onto [`GenerationError`]. Swapping providers only
//! changes how replies are produced, never how they are judged.

use tracing::debug;

use super::{CallFailure, ProviderFailure, ProviderReply};
use crate::error::GenerationError;

/// Classified result of one provider attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The provider produced message text
    Success(String),
    /// Worth another attempt: timeout, network, 408, 429, 5xx
    Transient(ProviderFailure),
    /// Retrying will not help: 401/403, other 4xx, empty content
    Fatal(ProviderFailure),
}

/// Statuses that may succeed on retry; 408 is an upstream timeout
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..=599).contains(&status)
}

/// Whether a failure may succeed on retry
pub fn is_transient(failure: &ProviderFailure) -> bool {
    match failure {
        ProviderFailure::Timeout(_) | ProviderFailure::Network(_) => true,
        ProviderFailure::Http { status, .. } => is_transient_status(*status),
        ProviderFailure::EmptyContent => false,
    }
}

/// Classify the raw result of one attempt
pub fn classify(result: Result<ProviderReply, ProviderFailure>) -> AttemptOutcome {
    let failure = match result {
        Ok(reply) if reply.is_success() => {
            return match reply.content {
                Some(text) if !text.trim().is_empty() => AttemptOutcome::Success(text),
                _ => {
                    debug!(status = reply.status, "classify: success status without content");
                    AttemptOutcome::Fatal(ProviderFailure::EmptyContent)
                }
            };
        }
        Ok(reply) => ProviderFailure::Http {
            status: reply.status,
            message: reply.detail.unwrap_or_default(),
            retry_after: reply.retry_after,
        },
        Err(failure) => failure,
    };

    if is_transient(&failure) {
        AttemptOutcome::Transient(failure)
    } else {
        AttemptOutcome::Fatal(failure)
    }
}

/// Map a failed call onto the generation error taxonomy
pub fn to_generation_error(failure: &CallFailure) -> GenerationError {
    debug!(%failure, "to_generation_error: called");
    match failure {
        CallFailure::Exhausted { attempts, last } if last.is_rate_limit() => GenerationError::ProviderRateLimited {
            message: format!("Still rate limited after {} attempt(s): {}", attempts, last),
        },
        CallFailure::Exhausted { attempts, last } => GenerationError::ProviderUnavailable {
            message: format!("Gave up after {} attempt(s): {}", attempts, last),
            status: last.status(),
        },
        CallFailure::Fatal { failure, .. } => match failure {
            ProviderFailure::Http { status, message, .. } if failure.is_auth() => GenerationError::ProviderAuthFailed {
                message: message.clone(),
                status: *status,
            },
            ProviderFailure::EmptyContent => GenerationError::MalformedResponse {
                message: failure.to_string(),
            },
            other => GenerationError::ProviderUnavailable {
                message: other.to_string(),
                status: other.status(),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn http(status: u16) -> ProviderFailure {
        ProviderFailure::Http {
            status,
            message: "err".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn test_success_with_content() {
        assert_eq!(
            classify(Ok(ProviderReply::ok("{\"a\":1}"))),
            AttemptOutcome::Success("{\"a\":1}".to_string())
        );
    }

    #[test]
    fn test_success_without_content_is_fatal() {
        let mut reply = ProviderReply::ok("");
        assert_eq!(
            classify(Ok(reply.clone())),
            AttemptOutcome::Fatal(ProviderFailure::EmptyContent)
        );
        reply.content = None;
        assert_eq!(classify(Ok(reply)), AttemptOutcome::Fatal(ProviderFailure::EmptyContent));
    }

    #[test]
    fn test_transient_statuses() {
        for status in [408, 429, 500, 502, 503, 504, 599] {
            let outcome = classify(Ok(ProviderReply::status(status, "nope")));
            assert!(
                matches!(outcome, AttemptOutcome::Transient(_)),
                "status {} should be transient",
                status
            );
        }
    }

    #[test]
    fn test_fatal_statuses() {
        for status in [400, 401, 403, 404, 422] {
            let outcome = classify(Ok(ProviderReply::status(status, "nope")));
            assert!(
                matches!(outcome, AttemptOutcome::Fatal(_)),
                "status {} should be fatal",
                status
            );
        }
    }

    #[test]
    fn test_transport_failures_are_transient() {
        assert!(matches!(
            classify(Err(ProviderFailure::Timeout(Duration::from_secs(1)))),
            AttemptOutcome::Transient(_)
        ));
        assert!(matches!(
            classify(Err(ProviderFailure::Network("reset".to_string()))),
            AttemptOutcome::Transient(_)
        ));
    }

    #[test]
    fn test_retry_after_is_kept() {
        let reply = ProviderReply::status(429, "slow").with_retry_after(Duration::from_secs(3));
        match classify(Ok(reply)) {
            AttemptOutcome::Transient(failure) => assert_eq!(failure.retry_after(), Some(Duration::from_secs(3))),
            other => panic!("expected transient, got {:?}", other),
        }
    }

    #[test]
    fn test_exhausted_rate_limit_maps_to_rate_limited() {
        let err = to_generation_error(&CallFailure::Exhausted {
            attempts: 3,
            last: http(429),
        });
        assert!(matches!(err, GenerationError::ProviderRateLimited { .. }));
    }

    #[test]
    fn test_exhausted_other_maps_to_unavailable() {
        let err = to_generation_error(&CallFailure::Exhausted {
            attempts: 3,
            last: http(503),
        });
        assert_eq!(err.upstream_status(), Some(503));
        assert!(matches!(err, GenerationError::ProviderUnavailable { .. }));

        let err = to_generation_error(&CallFailure::Exhausted {
            attempts: 3,
            last: ProviderFailure::Timeout(Duration::from_secs(30)),
        });
        assert!(matches!(err, GenerationError::ProviderUnavailable { status: None, .. }));
    }

    #[test]
    fn test_fatal_auth_maps_to_auth_failed() {
        for status in [401, 403] {
            let err = to_generation_error(&CallFailure::Fatal {
                attempt: 1,
                failure: http(status),
            });
            assert_eq!(
                err,
                GenerationError::ProviderAuthFailed {
                    message: "err".to_string(),
                    status
                }
            );
        }
    }

    #[test]
    fn test_fatal_empty_content_maps_to_malformed() {
        let err = to_generation_error(&CallFailure::Fatal {
            attempt: 1,
            failure: ProviderFailure::EmptyContent,
        });
        assert!(matches!(err, GenerationError::MalformedResponse { .. }));
    }

    #[test]
    fn test_exhausted_request_timeout_maps_to_unavailable() {
        let err = to_generation_error(&CallFailure::Exhausted {
            attempts: 3,
            last: http(408),
        });
        assert_eq!(err.upstream_status(), Some(408));
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn test_fatal_other_client_error_maps_to_unavailable() {
        let err = to_generation_error(&CallFailure::Fatal {
            attempt: 1,
            failure: http(404),
        });
        assert_eq!(err.upstream_status(), Some(404));
        assert_eq!(err.http_status(), 502);
    }
}
