//! Outbound webhook transport port.
//!
//! Thin HTTP boundary under the fan-out dispatcher. Keeping delivery behind
//! a port lets dispatch logic be tested against scripted transports without
//! network access.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Response from a delivered webhook request.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,

    /// First part of the response body, for failure diagnostics.
    pub body_excerpt: String,
}

impl TransportResponse {
    /// True for any 1xx/2xx status (and 3xx, which counts as accepted).
    pub fn is_accepted(&self) -> bool {
        self.status < 300
    }
}

/// Errors from a webhook delivery attempt.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("Request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Port for delivering outbound webhook requests.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POSTs `body` to `url` with the given headers, bounded by `timeout`.
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(&str, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}
