//! Payment HTTP endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    PaymentCancelResponse, PaymentCreateRequest, PaymentIntentResponse, PaymentListQuery,
    PaymentRefundRequest, PaymentRefundResponse, PaymentResponse, PaymentVerifyResponse,
};
pub use routes::routes;
