//! HTTP adapters - axum routers, handlers, and DTOs per feature.

mod error;
pub mod partners;
pub mod payments;
pub mod webhooks;

pub use error::{ApiError, ErrorResponse};

use std::sync::Arc;

use axum::Router;

use crate::application::handlers::payments::{
    CancelPaymentHandler, CreatePaymentHandler, RefundPaymentHandler, VerifyPaymentHandler,
};
use crate::application::handlers::webhooks::{InboundWebhookHandler, WebhookDispatcher};
use crate::config::WebhookConfig;
use crate::domain::webhook::SignatureCodec;
use crate::ports::{PartnerDirectory, PaymentProvider, PaymentRepository, WebhookTransport};

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn PaymentRepository>,
    pub provider: Arc<dyn PaymentProvider>,
    pub directory: Arc<dyn PartnerDirectory>,
    pub dispatcher: Arc<WebhookDispatcher>,
    pub transport: Arc<dyn WebhookTransport>,
    pub codec: SignatureCodec,
    pub webhook_config: WebhookConfig,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn create_payment_handler(&self) -> CreatePaymentHandler {
        CreatePaymentHandler::new(
            self.repository.clone(),
            self.provider.clone(),
            self.dispatcher.clone(),
        )
    }

    pub fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.repository.clone(),
            self.provider.clone(),
            self.dispatcher.clone(),
        )
    }

    pub fn cancel_payment_handler(&self) -> CancelPaymentHandler {
        CancelPaymentHandler::new(self.repository.clone(), self.provider.clone())
    }

    pub fn refund_payment_handler(&self) -> RefundPaymentHandler {
        RefundPaymentHandler::new(
            self.repository.clone(),
            self.provider.clone(),
            self.dispatcher.clone(),
        )
    }

    pub fn inbound_webhook_handler(&self) -> InboundWebhookHandler {
        InboundWebhookHandler::new(
            self.provider.clone(),
            self.repository.clone(),
            self.dispatcher.clone(),
        )
    }
}

/// Create the complete API router.
///
/// # Routes
///
/// - `/api/payments` - payment lifecycle operations
/// - `/api/partners` - partner administration and test deliveries
/// - `/api/webhooks` - inbound provider callbacks (signature-verified)
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/payments", payments::routes())
        .nest("/api/partners", partners::routes())
        .nest("/api/webhooks", webhooks::routes())
        .with_state(state)
}
