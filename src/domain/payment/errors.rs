//! Error types for payment operations.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::PaymentId;

use super::PaymentStatus;

/// Errors surfaced by payment commands.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Referenced payment does not exist.
    #[error("Payment {0} not found")]
    NotFound(PaymentId),

    /// An illegal state transition was attempted.
    #[error("Cannot {action} a payment in status '{status}'")]
    StateConflict {
        status: PaymentStatus,
        action: &'static str,
    },

    /// The upstream payment provider failed.
    #[error("Provider error: {message}")]
    Provider { message: String, retryable: bool },

    /// Persistence failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PaymentError {
    /// Creates a state-conflict error for the given attempted action.
    pub fn state_conflict(status: PaymentStatus, action: &'static str) -> Self {
        PaymentError::StateConflict { status, action }
    }

    /// Maps the error to an HTTP status code for the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::StateConflict { .. } => StatusCode::CONFLICT,
            PaymentError::Provider { .. } => StatusCode::BAD_GATEWAY,
            PaymentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PaymentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_conflict_names_status_and_action() {
        let err = PaymentError::state_conflict(PaymentStatus::Pending, "refund");
        assert_eq!(
            err.to_string(),
            "Cannot refund a payment in status 'pending'"
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = PaymentError::NotFound(PaymentId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn provider_errors_map_to_bad_gateway() {
        let err = PaymentError::Provider {
            message: "upstream 500".to_string(),
            retryable: true,
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
