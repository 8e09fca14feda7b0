//! PostgreSQL persistence adapters.

mod partner_directory;
mod payment_repository;

pub use partner_directory::PgPartnerDirectory;
pub use payment_repository::PgPaymentRepository;
