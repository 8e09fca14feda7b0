//! HTTP handlers for inbound provider webhooks.
//!
//! These endpoints carry no user authentication; the payload signature is
//! the credential. Raw body bytes are handed to the inbound handler
//! untouched, since the signature covers them exactly.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::application::handlers::webhooks::InboundOutcome;
use crate::domain::webhook::WebhookError;

use super::super::{ApiError, AppState};

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub outcome: &'static str,
}

impl From<InboundOutcome> for WebhookAckResponse {
    fn from(outcome: InboundOutcome) -> Self {
        let outcome = match outcome {
            InboundOutcome::Processed { .. } => "processed",
            InboundOutcome::AlreadyCurrent { .. } => "already_current",
            InboundOutcome::Acknowledged => "acknowledged",
        };
        Self {
            received: true,
            outcome,
        }
    }
}

/// POST /api/webhooks/stripe - Stripe callbacks, `Stripe-Signature` header.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    handle_inbound(state, headers, body, "Stripe-Signature").await
}

/// POST /api/webhooks/mock - Development provider callbacks,
/// `X-Webhook-Signature` header.
pub async fn mock_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    handle_inbound(state, headers, body, "X-Webhook-Signature").await
}

async fn handle_inbound(
    state: AppState,
    headers: HeaderMap,
    body: Bytes,
    signature_header: &'static str,
) -> Result<Json<WebhookAckResponse>, ApiError> {
    let signature = headers
        .get(signature_header)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::InvalidSignature)?;

    let outcome = state
        .inbound_webhook_handler()
        .handle(&body, signature)
        .await?;

    Ok(Json(WebhookAckResponse::from(outcome)))
}
