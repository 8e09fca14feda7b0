//! Payment domain - the payment aggregate and its lifecycle.

mod currency;
mod errors;
mod payment;
mod payment_type;
mod status;

pub use currency::Currency;
pub use errors::PaymentError;
pub use payment::{NewPayment, Payment};
pub use payment_type::PaymentType;
pub use status::PaymentStatus;
