//! RefundPaymentHandler - refunds a succeeded payment.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::foundation::PaymentId;
use crate::domain::partner::EventType;
use crate::domain::payment::{PaymentError, PaymentStatus};
use crate::ports::{PaymentProvider, PaymentRepository};

use crate::application::handlers::webhooks::{payment_event_fields, WebhookDispatcher};

/// Command to refund a payment, partially when an amount is given.
#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub payment_id: PaymentId,
    pub amount: Option<Decimal>,
}

/// Result of a refund attempt.
#[derive(Debug, Clone)]
pub struct RefundPaymentResult {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub refunded: bool,
    pub refund_id: Option<String>,
    pub error_message: Option<String>,
}

impl RefundPaymentResult {
    fn refused(payment_id: PaymentId, status: PaymentStatus, message: String) -> Self {
        Self {
            payment_id,
            status,
            refunded: false,
            refund_id: None,
            error_message: Some(message),
        }
    }
}

/// Handler for payment refunds.
///
/// A payment that is not refundable is refused before the provider is ever
/// contacted; provider-side business refusals come back as results, not
/// errors.
pub struct RefundPaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl RefundPaymentHandler {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        provider: Arc<dyn PaymentProvider>,
        dispatcher: Arc<WebhookDispatcher>,
    ) -> Self {
        Self {
            repository,
            provider,
            dispatcher,
        }
    }

    pub async fn handle(
        &self,
        cmd: RefundPaymentCommand,
    ) -> Result<RefundPaymentResult, PaymentError> {
        let mut payment = self
            .repository
            .get_by_id(&cmd.payment_id)
            .await?
            .ok_or(PaymentError::NotFound(cmd.payment_id))?;

        if !payment.can_be_refunded() {
            return Ok(RefundPaymentResult::refused(
                payment.id,
                payment.status,
                format!("payment in status '{}' cannot be refunded", payment.status),
            ));
        }

        let provider_payment_id = match &payment.provider_payment_id {
            Some(id) => id.clone(),
            None => {
                return Ok(RefundPaymentResult::refused(
                    payment.id,
                    payment.status,
                    "payment has no provider reference".to_string(),
                ))
            }
        };

        let outcome = self
            .provider
            .refund_payment(&provider_payment_id, cmd.amount)
            .await?;

        if !outcome.success {
            tracing::warn!(
                payment_id = %payment.id,
                reason = outcome.error_message.as_deref().unwrap_or("unspecified"),
                "Provider refused refund"
            );
            return Ok(RefundPaymentResult {
                payment_id: payment.id,
                status: payment.status,
                refunded: false,
                refund_id: None,
                error_message: outcome.error_message,
            });
        }

        payment.mark_refunded()?;
        self.repository.update(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            refund_id = outcome.refund_id.as_deref().unwrap_or(""),
            "Refunded payment"
        );

        self.dispatcher
            .dispatch(EventType::PaymentRefunded, payment_event_fields(&payment))
            .await;

        Ok(RefundPaymentResult {
            payment_id: payment.id,
            status: payment.status,
            refunded: true,
            refund_id: outcome.refund_id,
            error_message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryPartnerDirectory, InMemoryPaymentRepository};
    use crate::adapters::provider::MockProvider;
    use crate::config::WebhookConfig;
    use crate::domain::payment::{Currency, NewPayment, Payment, PaymentType};
    use crate::domain::webhook::SignatureCodec;
    use crate::ports::{
        PartnerDirectory, TransportError, TransportResponse, WebhookTransport,
    };
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CapturingTransport {
        bodies: Mutex<Vec<String>>,
    }

    impl CapturingTransport {
        fn bodies(&self) -> Vec<String> {
            self.bodies.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for CapturingTransport {
        async fn post(
            &self,
            _url: &str,
            body: &str,
            _headers: &[(&str, String)],
            _timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            self.bodies.lock().unwrap().push(body.to_string());
            Ok(TransportResponse {
                status: 200,
                body_excerpt: String::new(),
            })
        }
    }

    struct Fixture {
        handler: RefundPaymentHandler,
        repository: Arc<InMemoryPaymentRepository>,
        provider: Arc<MockProvider>,
        transport: Arc<CapturingTransport>,
    }

    async fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let provider = Arc::new(MockProvider::new(
            SecretString::new("whsec_mock_test".to_string()),
            "http://localhost:4200/payment",
            SignatureCodec::new(300),
        ));
        let directory = Arc::new(InMemoryPartnerDirectory::new(10));
        directory
            .create(
                &crate::domain::partner::Partner::create(
                    "Partner",
                    "https://partner.test/hooks",
                    vec![crate::domain::partner::EventType::All],
                    None,
                    None,
                )
                .unwrap(),
            )
            .await
            .unwrap();
        let transport = Arc::new(CapturingTransport::default());
        let dispatcher = Arc::new(WebhookDispatcher::new(
            directory,
            transport.clone(),
            SignatureCodec::new(300),
            WebhookConfig::default(),
        ));
        Fixture {
            handler: RefundPaymentHandler::new(
                repository.clone(),
                provider.clone(),
                dispatcher,
            ),
            repository,
            provider,
            transport,
        }
    }

    fn payment_in(status: PaymentStatus) -> Payment {
        let mut payment = Payment::create(NewPayment {
            amount: "25.00".parse().unwrap(),
            currency: Currency::Usd,
            payment_type: PaymentType::Reservation,
            provider: "mock".to_string(),
            reservation_id: None,
            subscription_id: None,
            user_id: None,
            payer_email: None,
            payer_name: None,
            description: None,
            metadata: HashMap::new(),
            idempotency_key: None,
        });
        if status != PaymentStatus::Pending {
            payment.mark_processing("mock_pi_refund", None).unwrap();
        }
        if status == PaymentStatus::Succeeded {
            payment.mark_succeeded().unwrap();
        }
        payment
    }

    #[tokio::test]
    async fn pending_payment_is_refused_without_provider_contact() {
        let fixture = fixture().await;
        let payment = payment_in(PaymentStatus::Pending);
        fixture.repository.create(&payment).await.unwrap();

        let result = fixture
            .handler
            .handle(RefundPaymentCommand {
                payment_id: payment.id,
                amount: None,
            })
            .await
            .unwrap();

        assert!(!result.refunded);
        assert!(result.error_message.unwrap().contains("pending"));
        // The provider was never contacted.
        assert!(fixture.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn succeeded_payment_refunds_and_fans_out() {
        let fixture = fixture().await;
        let payment = payment_in(PaymentStatus::Succeeded);
        fixture.repository.create(&payment).await.unwrap();
        fixture.provider.simulate_success("mock_pi_refund");

        let result = fixture
            .handler
            .handle(RefundPaymentCommand {
                payment_id: payment.id,
                amount: None,
            })
            .await
            .unwrap();

        assert!(result.refunded);
        assert!(result.refund_id.unwrap().starts_with("mock_re_"));
        assert_eq!(result.status, PaymentStatus::Refunded);

        let stored = fixture
            .repository
            .get_by_id(&payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Refunded);

        let bodies = fixture.transport.bodies();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("payment.refunded"));
    }

    #[tokio::test]
    async fn provider_refusal_leaves_the_payment_succeeded() {
        let fixture = fixture().await;
        let payment = payment_in(PaymentStatus::Succeeded);
        fixture.repository.create(&payment).await.unwrap();
        // Provider-side state says the charge is already refunded.
        fixture.provider.simulate_failure("mock_pi_refund");

        let result = fixture
            .handler
            .handle(RefundPaymentCommand {
                payment_id: payment.id,
                amount: None,
            })
            .await
            .unwrap();

        assert!(!result.refunded);
        assert!(result.error_message.is_some());
        let stored = fixture
            .repository
            .get_by_id(&payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Succeeded);
        assert!(fixture.transport.bodies().is_empty());
    }
}
