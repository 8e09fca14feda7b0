//! Payment lifecycle status.

use serde::{Deserialize, Serialize};

/// Status of a payment through its lifecycle.
///
/// Legal transitions:
///
/// ```text
/// PENDING -> PROCESSING -> { SUCCEEDED, FAILED, CANCELED }
/// PENDING -> CANCELED
/// SUCCEEDED -> REFUNDED
/// ```
///
/// Everything else is rejected by the entity's transition methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created locally, no provider intent yet.
    Pending,

    /// Provider intent created, awaiting completion.
    Processing,

    /// Provider confirmed the payment.
    Succeeded,

    /// Provider rejected the payment.
    Failed,

    /// Canceled before completion.
    Canceled,

    /// Succeeded payment that was refunded.
    Refunded,
}

impl PaymentStatus {
    /// Returns true once no further forward transition is possible.
    ///
    /// SUCCEEDED is not terminal: it may still move to REFUNDED.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Failed | PaymentStatus::Canceled | PaymentStatus::Refunded
        )
    }

    /// Canonical lower-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Canceled => "canceled",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
