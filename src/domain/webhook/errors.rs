//! Error types for inbound webhook handling.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while processing an inbound provider webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed (bad, missing, or replayed).
    #[error("Invalid signature")]
    InvalidSignature,

    /// Failed to parse the webhook payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from the provider event.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Referenced payment could not be found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Attempted state transition is not valid.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Persistence failed.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Repository(_)
                // Might be eventual consistency with the create flow.
                | WebhookError::PaymentNotFound(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 401 for authentication failures (no retry)
    /// - 400 for malformed payloads (no retry)
    /// - 5xx for transient conditions (provider retries)
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::ParseError(_) | WebhookError::MissingMetadata(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::PaymentNotFound(_)
            | WebhookError::InvalidTransition(_)
            | WebhookError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_is_unauthorized_and_final() {
        let err = WebhookError::InvalidSignature;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(!err.is_retryable());
    }

    #[test]
    fn parse_errors_are_bad_requests() {
        let err = WebhookError::ParseError("truncated JSON".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_payment_is_retryable() {
        let err = WebhookError::PaymentNotFound("pi_123".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn repository_errors_are_retryable() {
        let err = WebhookError::Repository("connection lost".to_string());
        assert!(err.is_retryable());
    }
}
