//! Axum router for inbound webhook endpoints.
//!
//! Separate from the payment routes because webhooks are authenticated by
//! signature, not by user identity.

use axum::routing::post;
use axum::Router;

use super::super::AppState;
use super::handlers::{mock_webhook, stripe_webhook};

/// Create the inbound webhooks router.
///
/// # Routes
///
/// - `POST /stripe` - Stripe callbacks
/// - `POST /mock` - development provider callbacks
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stripe", post(stripe_webhook))
        .route("/mock", post(mock_webhook))
}
