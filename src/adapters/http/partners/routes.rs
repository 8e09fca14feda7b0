//! Axum router for partner endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{
    create_partner, list_partners, partners_by_event, rotate_secret, test_webhook,
};

/// Create the partners API router.
///
/// # Routes
///
/// - `GET /` - list all partners
/// - `GET /by-event/:event` - partners subscribed to an event
/// - `POST /` - register a partner (secret issued once in the response)
/// - `POST /:id/rotate-secret` - replace a partner's secret
/// - `POST /test-webhook` - send a signed test delivery to a URL
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_partners).post(create_partner))
        .route("/by-event/:event", get(partners_by_event))
        .route("/:id/rotate-secret", post(rotate_secret))
        .route("/test-webhook", post(test_webhook))
}
