//! Inbound webhook HTTP endpoints.

mod handlers;
mod routes;

pub use handlers::WebhookAckResponse;
pub use routes::routes;
