//! Ports - contracts between the domain and the outside world.
//!
//! Each port is an async trait implemented by one or more adapters.

mod partner_directory;
mod payment_provider;
mod payment_repository;
mod webhook_transport;

pub use partner_directory::{DirectoryError, PartnerDirectory};
pub use payment_provider::{
    PaymentIntent, PaymentIntentRequest, PaymentProvider, ProviderError, RefundOutcome,
};
pub use payment_repository::{PaymentListFilter, PaymentRepository, RepositoryError};
pub use webhook_transport::{TransportError, TransportResponse, WebhookTransport};
