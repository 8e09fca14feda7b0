//! Partner HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    PartnerCreateRequest, PartnerCreatedResponse, PartnerResponse, SecretRotatedResponse,
    TestWebhookRequest, TestWebhookResponse,
};
pub use routes::routes;
