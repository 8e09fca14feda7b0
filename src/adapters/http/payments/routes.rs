//! Axum router for payment endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::super::AppState;
use super::handlers::{
    cancel_payment, create_payment, get_payment, list_payments, refund_payment, verify_payment,
};

/// Create the payments API router.
///
/// # Routes
///
/// - `POST /` - create payment (supports `Idempotency-Key` header)
/// - `GET /` - list payments (foreign-id and status filters)
/// - `GET /:id` - payment details
/// - `POST /:id/verify` - sync status with the provider
/// - `POST /:id/cancel` - cancel a not-yet-settled payment
/// - `POST /:id/refund` - refund a succeeded payment
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment).get(list_payments))
        .route("/:id", get(get_payment))
        .route("/:id/verify", post(verify_payment))
        .route("/:id/cancel", post(cancel_payment))
        .route("/:id/refund", post(refund_payment))
}
