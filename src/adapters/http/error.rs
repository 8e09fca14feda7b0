//! API error responses.
//!
//! Maps domain and port errors onto HTTP status codes and a uniform JSON
//! error body. Partner secrets never appear in these messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::foundation::ValidationError;
use crate::domain::payment::PaymentError;
use crate::domain::webhook::WebhookError;
use crate::ports::DirectoryError;

/// JSON body for error responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Error type returned by API handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.code, self.message);
        (self.status, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        let code = match &err {
            PaymentError::NotFound(_) => "PAYMENT_NOT_FOUND",
            PaymentError::StateConflict { .. } => "STATE_CONFLICT",
            PaymentError::Provider { .. } => "PROVIDER_ERROR",
            PaymentError::Repository(_) => "INTERNAL_ERROR",
            PaymentError::Validation(_) => "VALIDATION_FAILED",
        };
        Self::new(err.status_code(), code, err.to_string())
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        let code = match &err {
            WebhookError::InvalidSignature => "INVALID_SIGNATURE",
            WebhookError::ParseError(_) | WebhookError::MissingMetadata(_) => "BAD_EVENT",
            _ => "WEBHOOK_ERROR",
        };
        Self::new(err.status_code(), code, err.to_string())
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(id) => Self::not_found(format!("Partner {id} not found")),
            DirectoryError::Database(message) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::unprocessable(err.to_string())
    }
}
