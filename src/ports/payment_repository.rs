//! Payment repository port.
//!
//! Persistence contract for the payment aggregate. The backing store must
//! enforce a unique constraint on the idempotency key so a repeated create
//! surfaces as [`RepositoryError::DuplicateIdempotencyKey`] instead of a
//! second row.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{PaymentId, ReservationId, SubscriptionId, UserId};
use crate::domain::payment::{Payment, PaymentError, PaymentStatus};

/// Errors from payment persistence operations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The idempotency key is already bound to another payment.
    #[error("Idempotency key '{0}' already used")]
    DuplicateIdempotencyKey(String),

    /// Underlying store failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<RepositoryError> for PaymentError {
    fn from(err: RepositoryError) -> Self {
        PaymentError::Repository(err.to_string())
    }
}

/// Filter for listing payments.
#[derive(Debug, Clone)]
pub struct PaymentListFilter {
    pub status: Option<PaymentStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PaymentListFilter {
    fn default() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Persistence port for the payment aggregate.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Persists a new payment.
    async fn create(&self, payment: &Payment) -> Result<(), RepositoryError>;

    /// Fetches a payment by internal id.
    async fn get_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError>;

    /// Fetches the payment bound to an idempotency key.
    async fn get_by_idempotency_key(&self, key: &str)
        -> Result<Option<Payment>, RepositoryError>;

    /// All payments for a reservation, newest first.
    async fn get_by_reservation_id(
        &self,
        reservation_id: &ReservationId,
    ) -> Result<Vec<Payment>, RepositoryError>;

    /// All payments for a subscription, newest first.
    async fn get_by_subscription_id(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Payment>, RepositoryError>;

    /// All payments for a user, newest first.
    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Vec<Payment>, RepositoryError>;

    /// Overwrites all mutable fields of an existing payment.
    async fn update(&self, payment: &Payment) -> Result<(), RepositoryError>;

    /// Updates only status and failure reason.
    ///
    /// Returns the updated payment, or None when absent.
    async fn update_status(
        &self,
        id: &PaymentId,
        status: PaymentStatus,
        failure_reason: Option<&str>,
    ) -> Result<Option<Payment>, RepositoryError>;

    /// Deletes a payment. Returns true when a row was removed.
    async fn delete(&self, id: &PaymentId) -> Result<bool, RepositoryError>;

    /// Lists payments, newest first, with optional status filter and paging.
    async fn list(&self, filter: PaymentListFilter) -> Result<Vec<Payment>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PaymentRepository) {}
    }

    #[test]
    fn duplicate_key_error_names_the_key() {
        let err = RepositoryError::DuplicateIdempotencyKey("abc-123".into());
        assert_eq!(err.to_string(), "Idempotency key 'abc-123' already used");
    }

    #[test]
    fn default_filter_pages_from_the_start() {
        let filter = PaymentListFilter::default();
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
        assert!(filter.status.is_none());
    }
}
