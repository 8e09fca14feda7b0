//! CancelPaymentHandler - cancels a not-yet-settled payment.

use std::sync::Arc;

use crate::domain::foundation::PaymentId;
use crate::domain::payment::{PaymentError, PaymentStatus};
use crate::ports::{PaymentProvider, PaymentRepository};

/// Command to cancel a payment.
#[derive(Debug, Clone)]
pub struct CancelPaymentCommand {
    pub payment_id: PaymentId,
}

/// Result of a cancellation attempt.
#[derive(Debug, Clone)]
pub struct CancelPaymentResult {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,

    /// False when the payment was not cancelable; the refusal is a result,
    /// not an error.
    pub canceled: bool,
}

/// Handler for payment cancellation.
pub struct CancelPaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
}

impl CancelPaymentHandler {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            repository,
            provider,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelPaymentCommand,
    ) -> Result<CancelPaymentResult, PaymentError> {
        let mut payment = self
            .repository
            .get_by_id(&cmd.payment_id)
            .await?
            .ok_or(PaymentError::NotFound(cmd.payment_id))?;

        if !payment.can_be_canceled() {
            return Ok(CancelPaymentResult {
                payment_id: payment.id,
                status: payment.status,
                canceled: false,
            });
        }

        // Expire the provider side first; a payment already settled there
        // just reports false, which does not block the local cancel.
        if let Some(provider_payment_id) = &payment.provider_payment_id {
            let expired = self.provider.cancel_payment(provider_payment_id).await?;
            if !expired {
                tracing::debug!(
                    payment_id = %payment.id,
                    "Provider reported payment already terminal on cancel"
                );
            }
        }

        payment.mark_canceled()?;
        self.repository.update(&payment).await?;

        tracing::info!(payment_id = %payment.id, "Canceled payment");

        Ok(CancelPaymentResult {
            payment_id: payment.id,
            status: payment.status,
            canceled: true,
        })
    }
}
