//! VerifyPaymentHandler - syncs a payment's status with the provider.

use std::sync::Arc;

use crate::domain::foundation::PaymentId;
use crate::domain::partner::EventType;
use crate::domain::payment::{PaymentError, PaymentStatus};
use crate::ports::{PaymentProvider, PaymentRepository};

use crate::application::handlers::webhooks::{payment_event_fields, WebhookDispatcher};

/// Query to verify a payment against the provider.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub payment_id: PaymentId,
}

/// Result of a verification.
#[derive(Debug, Clone)]
pub struct VerifyPaymentResult {
    pub payment_id: PaymentId,
    pub previous_status: PaymentStatus,
    pub current_status: PaymentStatus,

    /// True when verification changed the local status.
    pub synchronized: bool,
}

/// Handler for provider status verification.
///
/// Used after the payer returns from checkout, or to reconcile missed
/// webhooks. Observing the same status twice is an idempotent no-op, and a
/// stale provider status never downgrades a settled payment.
pub struct VerifyPaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl VerifyPaymentHandler {
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
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, PaymentError> {
        let mut payment = self
            .repository
            .get_by_id(&cmd.payment_id)
            .await?
            .ok_or(PaymentError::NotFound(cmd.payment_id))?;

        let previous_status = payment.status;

        let provider_payment_id = match &payment.provider_payment_id {
            Some(id) => id.clone(),
            // Nothing to verify before an intent exists.
            None => {
                return Ok(VerifyPaymentResult {
                    payment_id: payment.id,
                    previous_status,
                    current_status: previous_status,
                    synchronized: false,
                })
            }
        };

        let provider_status = self.provider.verify_payment(&provider_payment_id).await?;

        // Transitions apply only where legal from the current status; a
        // stale PENDING from the provider never rewinds a settled payment,
        // and re-observing the same status bumps nothing.
        let outbound = match (payment.status, provider_status) {
            (PaymentStatus::Processing, PaymentStatus::Succeeded) => {
                payment.mark_succeeded()?;
                Some(EventType::PaymentSucceeded)
            }
            (PaymentStatus::Processing, PaymentStatus::Failed) => {
                payment.mark_failed(None)?;
                Some(EventType::PaymentFailed)
            }
            (PaymentStatus::Pending | PaymentStatus::Processing, PaymentStatus::Canceled) => {
                payment.mark_canceled()?;
                None
            }
            _ => {
                return Ok(VerifyPaymentResult {
                    payment_id: payment.id,
                    previous_status,
                    current_status: payment.status,
                    synchronized: false,
                })
            }
        };

        self.repository.update(&payment).await?;

        tracing::info!(
            payment_id = %payment.id,
            from = %previous_status,
            to = %payment.status,
            "Synchronized payment with provider"
        );

        if let Some(event) = outbound {
            self.dispatcher
                .dispatch(event, payment_event_fields(&payment))
                .await;
        }

        Ok(VerifyPaymentResult {
            payment_id: payment.id,
            previous_status,
            current_status: payment.status,
            synchronized: true,
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
        handler: VerifyPaymentHandler,
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
            handler: VerifyPaymentHandler::new(
                repository.clone(),
                provider.clone(),
                dispatcher,
            ),
            repository,
            provider,
            transport,
        }
    }

    async fn processing_payment(fixture: &Fixture) -> (Payment, String) {
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
        let intent = fixture
            .provider
            .create_payment_intent(crate::ports::PaymentIntentRequest {
                amount: payment.amount,
                currency: payment.currency,
                description: None,
                metadata: HashMap::new(),
                success_url: None,
                cancel_url: None,
                payer_email: None,
            })
            .await
            .unwrap();
        let provider_id = intent.provider_payment_id.clone();
        payment
            .mark_processing(intent.provider_payment_id, intent.checkout_url)
            .unwrap();
        fixture.repository.create(&payment).await.unwrap();
        (payment, provider_id)
    }

    #[tokio::test]
    async fn succeeded_at_provider_transitions_and_fans_out() {
        let fixture = fixture().await;
        let (payment, provider_id) = processing_payment(&fixture).await;
        fixture.provider.simulate_success(&provider_id);

        let result = fixture
            .handler
            .handle(VerifyPaymentCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert!(result.synchronized);
        assert_eq!(result.previous_status, PaymentStatus::Processing);
        assert_eq!(result.current_status, PaymentStatus::Succeeded);

        let bodies = fixture.transport.bodies();
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("payment.succeeded"));
    }

    #[tokio::test]
    async fn repeated_verification_is_an_idempotent_no_op() {
        let fixture = fixture().await;
        let (payment, provider_id) = processing_payment(&fixture).await;
        fixture.provider.simulate_success(&provider_id);

        fixture
            .handler
            .handle(VerifyPaymentCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();
        let first_updated = fixture
            .repository
            .get_by_id(&payment.id)
            .await
            .unwrap()
            .unwrap()
            .updated_at;

        let second = fixture
            .handler
            .handle(VerifyPaymentCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert!(!second.synchronized);
        assert_eq!(second.current_status, PaymentStatus::Succeeded);
        let stored = fixture
            .repository
            .get_by_id(&payment.id)
            .await
            .unwrap()
            .unwrap();
        // No timestamp bump on the no-op.
        assert_eq!(stored.updated_at, first_updated);
        // No second fan-out either.
        assert_eq!(fixture.transport.bodies().len(), 1);
    }

    #[tokio::test]
    async fn failed_at_provider_transitions_and_fans_out() {
        let fixture = fixture().await;
        let (payment, provider_id) = processing_payment(&fixture).await;
        fixture.provider.simulate_failure(&provider_id);

        let result = fixture
            .handler
            .handle(VerifyPaymentCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert_eq!(result.current_status, PaymentStatus::Failed);
        assert!(fixture.transport.bodies()[0].contains("payment.failed"));
    }

    #[tokio::test]
    async fn pending_payment_without_intent_is_left_alone() {
        let fixture = fixture().await;
        let payment = Payment::create(NewPayment {
            amount: "10.00".parse().unwrap(),
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
        fixture.repository.create(&payment).await.unwrap();

        let result = fixture
            .handler
            .handle(VerifyPaymentCommand {
                payment_id: payment.id,
            })
            .await
            .unwrap();

        assert!(!result.synchronized);
        assert_eq!(result.current_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn missing_payment_is_not_found() {
        let fixture = fixture().await;
        let err = fixture
            .handler
            .handle(VerifyPaymentCommand {
                payment_id: PaymentId::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }
}
