//! Partner directory port.
//!
//! Single contract for resolving webhook partners and recording delivery
//! outcomes. The directory is the one source of truth for partner state;
//! the dispatcher only ever reads a snapshot per dispatch cycle and mutates
//! partners exclusively through the bookkeeping calls below.
//!
//! # Atomicity
//!
//! `record_delivery_success` and `record_delivery_failure` must be atomic
//! with respect to concurrent dispatch cycles for the same partner: two
//! simultaneous webhook bursts must never lose a failure count between them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::PartnerId;
use crate::domain::partner::{EventType, Partner, PartnerStatus};

/// Errors from partner directory operations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Referenced partner does not exist.
    #[error("Partner {0} not found")]
    NotFound(PartnerId),

    /// Underlying store failure.
    #[error("Database error: {0}")]
    Database(String),
}

/// Port for partner lookup and delivery bookkeeping.
#[async_trait]
pub trait PartnerDirectory: Send + Sync {
    /// Partners eligible for delivery of the given event: ACTIVE status and
    /// subscribed (directly or via wildcard).
    async fn partners_for_event(&self, event: EventType)
        -> Result<Vec<Partner>, DirectoryError>;

    /// All partners regardless of status.
    async fn list(&self) -> Result<Vec<Partner>, DirectoryError>;

    /// Fetches a partner by id.
    async fn find_by_id(&self, id: &PartnerId) -> Result<Option<Partner>, DirectoryError>;

    /// Registers a new partner.
    async fn create(&self, partner: &Partner) -> Result<(), DirectoryError>;

    /// Overwrites a partner's mutable fields (including a rotated secret).
    async fn update(&self, partner: &Partner) -> Result<(), DirectoryError>;

    /// Atomically records a successful delivery: increments the total,
    /// resets the failure streak, stamps the delivery time.
    async fn record_delivery_success(&self, id: &PartnerId) -> Result<(), DirectoryError>;

    /// Atomically records a failed delivery, suspending the partner when the
    /// failure streak reaches the configured threshold. Returns the
    /// partner's resulting status.
    async fn record_delivery_failure(
        &self,
        id: &PartnerId,
    ) -> Result<PartnerStatus, DirectoryError>;
}
