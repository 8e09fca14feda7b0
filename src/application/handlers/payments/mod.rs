//! Payment command handlers.

mod cancel_payment;
mod create_payment;
mod refund_payment;
mod verify_payment;

pub use cancel_payment::{CancelPaymentCommand, CancelPaymentHandler, CancelPaymentResult};
pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult};
pub use refund_payment::{RefundPaymentCommand, RefundPaymentHandler, RefundPaymentResult};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult};
