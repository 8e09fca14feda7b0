//! CreatePaymentHandler - creates a payment and its provider intent.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::foundation::{ReservationId, SubscriptionId, UserId};
use crate::domain::partner::EventType;
use crate::domain::payment::{Currency, NewPayment, Payment, PaymentError, PaymentType};
use crate::ports::{
    PaymentIntentRequest, PaymentProvider, PaymentRepository, RepositoryError,
};

use crate::application::handlers::webhooks::{payment_event_fields, WebhookDispatcher};

/// Command to create a new payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub amount: Decimal,
    pub currency: Currency,
    pub payment_type: PaymentType,
    pub reservation_id: Option<ReservationId>,
    pub subscription_id: Option<SubscriptionId>,
    pub user_id: Option<UserId>,
    pub payer_email: Option<String>,
    pub payer_name: Option<String>,
    pub description: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,

    /// Caller-supplied key; a repeated key returns the original payment.
    pub idempotency_key: Option<String>,
}

/// Result of creating a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentResult {
    pub payment: Payment,
    pub checkout_url: Option<String>,
    pub client_secret: Option<String>,

    /// True when an existing payment was returned for a repeated key.
    pub idempotent_replay: bool,
}

/// Handler for creating payments.
///
/// Orchestrates entity creation, the provider intent, persistence, and the
/// `payment.created` notification.
pub struct CreatePaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    provider: Arc<dyn PaymentProvider>,
    dispatcher: Arc<WebhookDispatcher>,
}

impl CreatePaymentHandler {
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
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, PaymentError> {
        if cmd.amount <= Decimal::ZERO {
            return Err(PaymentError::Validation(format!(
                "amount must be positive, got {}",
                cmd.amount
            )));
        }

        // A repeated idempotency key returns the original payment.
        if let Some(key) = &cmd.idempotency_key {
            if let Some(existing) = self.repository.get_by_idempotency_key(key).await? {
                tracing::info!(payment_id = %existing.id, "Replayed idempotent create");
                return Ok(replay(existing));
            }
        }

        let mut payment = Payment::create(NewPayment {
            amount: cmd.amount,
            currency: cmd.currency,
            payment_type: cmd.payment_type,
            provider: self.provider.name().to_string(),
            reservation_id: cmd.reservation_id,
            subscription_id: cmd.subscription_id,
            user_id: cmd.user_id,
            payer_email: cmd.payer_email.clone(),
            payer_name: cmd.payer_name,
            description: cmd.description.clone(),
            metadata: cmd.metadata.clone(),
            idempotency_key: cmd.idempotency_key.clone(),
        });

        // The provider echoes metadata back in webhooks; the internal id is
        // what lets the inbound handler find this payment again.
        let mut provider_metadata: HashMap<String, String> = cmd
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), stringify(v)))
            .collect();
        provider_metadata.insert("payment_id".to_string(), payment.id.to_string());

        let intent = self
            .provider
            .create_payment_intent(PaymentIntentRequest {
                amount: cmd.amount,
                currency: cmd.currency,
                description: cmd.description,
                metadata: provider_metadata,
                success_url: cmd.success_url,
                cancel_url: cmd.cancel_url,
                payer_email: cmd.payer_email,
            })
            .await?;

        payment.mark_processing(intent.provider_payment_id, intent.checkout_url.clone())?;

        match self.repository.create(&payment).await {
            Ok(()) => {}
            // Lost a create race on the same key: return the winner.
            Err(RepositoryError::DuplicateIdempotencyKey(key)) => {
                let existing = self
                    .repository
                    .get_by_idempotency_key(&key)
                    .await?
                    .ok_or_else(|| {
                        PaymentError::Repository(format!(
                            "payment for idempotency key '{key}' vanished"
                        ))
                    })?;
                return Ok(replay(existing));
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(
            payment_id = %payment.id,
            provider = %payment.provider,
            amount = %payment.amount,
            "Created payment"
        );

        // Best-effort notification; a webhook outage never fails the create.
        self.dispatcher
            .dispatch(EventType::PaymentCreated, payment_event_fields(&payment))
            .await;

        Ok(CreatePaymentResult {
            checkout_url: payment.checkout_url.clone(),
            client_secret: intent.client_secret,
            payment,
            idempotent_replay: false,
        })
    }
}

fn replay(existing: Payment) -> CreatePaymentResult {
    CreatePaymentResult {
        checkout_url: existing.checkout_url.clone(),
        client_secret: None,
        payment: existing,
        idempotent_replay: true,
    }
}

/// Renders a metadata value the way providers expect: bare strings stay
/// bare, everything else becomes its JSON text.
fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryPartnerDirectory, InMemoryPaymentRepository};
    use crate::adapters::provider::MockProvider;
    use crate::config::WebhookConfig;
    use crate::domain::payment::PaymentStatus;
    use crate::domain::webhook::SignatureCodec;
    use crate::ports::{TransportError, TransportResponse, WebhookTransport};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CapturingTransport {
        bodies: Mutex<Vec<String>>,
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

    fn handler() -> (CreatePaymentHandler, Arc<InMemoryPaymentRepository>) {
        let repository = Arc::new(InMemoryPaymentRepository::new());
        let provider = Arc::new(MockProvider::new(
            SecretString::new("whsec_mock_test".to_string()),
            "http://localhost:4200/payment",
            SignatureCodec::new(300),
        ));
        let dispatcher = Arc::new(WebhookDispatcher::new(
            Arc::new(InMemoryPartnerDirectory::new(10)),
            Arc::new(CapturingTransport::default()),
            SignatureCodec::new(300),
            WebhookConfig::default(),
        ));
        (
            CreatePaymentHandler::new(repository.clone(), provider, dispatcher),
            repository,
        )
    }

    fn command(key: Option<&str>) -> CreatePaymentCommand {
        CreatePaymentCommand {
            amount: "25.00".parse().unwrap(),
            currency: Currency::Usd,
            payment_type: PaymentType::Reservation,
            reservation_id: None,
            subscription_id: None,
            user_id: None,
            payer_email: Some("payer@example.com".to_string()),
            payer_name: None,
            description: Some("Table for two".to_string()),
            metadata: HashMap::new(),
            success_url: None,
            cancel_url: None,
            idempotency_key: key.map(String::from),
        }
    }

    #[tokio::test]
    async fn creates_a_processing_payment_with_checkout_url() {
        let (handler, repository) = handler();

        let result = handler.handle(command(None)).await.unwrap();

        assert_eq!(result.payment.status, PaymentStatus::Processing);
        assert!(!result.idempotent_replay);
        assert!(result.checkout_url.unwrap().contains("mock-checkout"));
        assert!(result.payment.provider_payment_id.is_some());

        let stored = repository
            .get_by_id(&result.payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, PaymentStatus::Processing);
    }

    #[tokio::test]
    async fn repeated_idempotency_key_returns_the_original() {
        let (handler, repository) = handler();

        let first = handler.handle(command(Some("key-1"))).await.unwrap();
        let second = handler.handle(command(Some("key-1"))).await.unwrap();

        assert_eq!(first.payment.id, second.payment.id);
        assert!(second.idempotent_replay);

        // Exactly one persisted record.
        let all = repository.list(Default::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let (handler, _) = handler();
        let mut cmd = command(None);
        cmd.amount = Decimal::ZERO;

        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
    }

    #[tokio::test]
    async fn distinct_keys_create_distinct_payments() {
        let (handler, repository) = handler();

        handler.handle(command(Some("key-a"))).await.unwrap();
        handler.handle(command(Some("key-b"))).await.unwrap();

        let all = repository.list(Default::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
