//! Webhook fan-out dispatcher.
//!
//! Takes one domain event and delivers it to every subscribed ACTIVE
//! partner as an independently signed HTTP POST. Deliveries run
//! concurrently and are fully isolated: one partner timing out or erroring
//! never blocks another, and never fails the payment operation that
//! triggered the dispatch.
//!
//! Per-partner outcomes are recorded through the directory's atomic
//! bookkeeping calls, which also enforce auto-suspension.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};

use crate::config::WebhookConfig;
use crate::domain::foundation::PartnerId;
use crate::domain::partner::{EventType, Partner, PartnerStatus};
use crate::domain::webhook::{EventEnvelope, SignatureCodec};
use crate::ports::{PartnerDirectory, TransportError, WebhookTransport};

/// Classified outcome of one partner delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Endpoint accepted the webhook (status < 300).
    Delivered { status: u16 },

    /// Endpoint answered with a non-success status.
    Rejected { status: u16, error: String },

    /// Delivery did not complete within the timeout.
    TimedOut,

    /// Connection-level failure.
    Failed { error: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    /// Short label used in logs and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "success",
            DeliveryOutcome::Rejected { .. } => "failed",
            DeliveryOutcome::TimedOut => "timeout",
            DeliveryOutcome::Failed { .. } => "error",
        }
    }
}

/// Outcome of one partner's delivery within a dispatch cycle.
#[derive(Debug, Clone)]
pub struct PartnerDeliveryResult {
    pub partner_id: PartnerId,
    pub partner_name: String,
    pub outcome: DeliveryOutcome,
}

/// Aggregated result of a dispatch cycle.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub results: Vec<PartnerDeliveryResult>,
}

impl DispatchReport {
    pub fn delivered_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.delivered_count()
    }
}

/// Fans out signed event notifications to subscribed partners.
pub struct WebhookDispatcher {
    directory: Arc<dyn PartnerDirectory>,
    transport: Arc<dyn WebhookTransport>,
    codec: SignatureCodec,
    config: WebhookConfig,
}

impl WebhookDispatcher {
    pub fn new(
        directory: Arc<dyn PartnerDirectory>,
        transport: Arc<dyn WebhookTransport>,
        codec: SignatureCodec,
        config: WebhookConfig,
    ) -> Self {
        Self {
            directory,
            transport,
            codec,
            config,
        }
    }

    /// Delivers `event` with the given payload fields to every subscribed
    /// partner.
    ///
    /// Never fails: a directory outage degrades to "zero partners
    /// notified", and per-partner failures are captured in the report.
    pub async fn dispatch(&self, event: EventType, fields: Map<String, Value>) -> DispatchReport {
        let partners = match self.directory.partners_for_event(event).await {
            Ok(partners) => partners,
            Err(err) => {
                tracing::warn!(
                    event = %event,
                    error = %err,
                    "Partner resolution failed; notifying zero partners"
                );
                return DispatchReport::default();
            }
        };

        // One envelope per dispatch: the signed bytes and the delivered body
        // are identical for every partner, only the signature differs.
        let body = EventEnvelope::new(event, fields).to_json();

        let deliveries = partners
            .into_iter()
            .map(|partner| self.deliver(event, partner, &body));
        let results = join_all(deliveries).await;

        let report = DispatchReport { results };
        tracing::info!(
            event = %event,
            delivered = report.delivered_count(),
            failed = report.failed_count(),
            "Webhook dispatch complete"
        );

        self.notify_workflow(event, &body).await;

        report
    }

    /// Delivers to a single partner and records the outcome.
    async fn deliver(
        &self,
        event: EventType,
        partner: Partner,
        body: &str,
    ) -> PartnerDeliveryResult {
        let signature = self.codec.sign(partner.secret(), body);
        let headers = [
            ("X-Webhook-Signature", signature),
            ("X-Partner-Id", partner.id.to_string()),
        ];

        let outcome = match self
            .transport
            .post(
                &partner.webhook_url,
                body,
                &headers,
                self.config.delivery_timeout(),
            )
            .await
        {
            Ok(response) if response.is_accepted() => {
                if let Err(err) = self.directory.record_delivery_success(&partner.id).await {
                    tracing::warn!(partner_id = %partner.id, error = %err, "Failed to record delivery success");
                }
                DeliveryOutcome::Delivered {
                    status: response.status,
                }
            }
            Ok(response) => {
                self.record_failure(&partner, event).await;
                DeliveryOutcome::Rejected {
                    status: response.status,
                    error: response.body_excerpt,
                }
            }
            Err(TransportError::Timeout) => {
                self.record_failure(&partner, event).await;
                DeliveryOutcome::TimedOut
            }
            Err(TransportError::Transport(error)) => {
                self.record_failure(&partner, event).await;
                DeliveryOutcome::Failed { error }
            }
        };

        if !outcome.is_success() {
            tracing::warn!(
                partner = %partner.name,
                event = %event,
                outcome = outcome.label(),
                "Webhook delivery failed"
            );
        }

        PartnerDeliveryResult {
            partner_id: partner.id,
            partner_name: partner.name,
            outcome,
        }
    }

    async fn record_failure(&self, partner: &Partner, event: EventType) {
        match self.directory.record_delivery_failure(&partner.id).await {
            Ok(PartnerStatus::Suspended) => {
                tracing::warn!(
                    partner = %partner.name,
                    event = %event,
                    "Partner suspended after repeated delivery failures"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(partner_id = %partner.id, error = %err, "Failed to record delivery failure");
            }
        }
    }

    /// Best-effort notification of the internal workflow engine on terminal
    /// payment events. Unsigned, same timeout, never escalated.
    async fn notify_workflow(&self, event: EventType, body: &str) {
        let url = match &self.config.workflow_webhook_url {
            Some(url) => url,
            None => return,
        };
        if !matches!(
            event,
            EventType::PaymentSucceeded | EventType::PaymentFailed | EventType::PaymentRefunded
        ) {
            return;
        }

        match self
            .transport
            .post(url, body, &[], self.config.delivery_timeout())
            .await
        {
            Ok(response) if response.is_accepted() => {
                tracing::debug!(event = %event, "Workflow engine notified");
            }
            Ok(response) => {
                tracing::warn!(event = %event, status = response.status, "Workflow engine rejected notification");
            }
            Err(err) => {
                tracing::warn!(event = %event, error = %err, "Workflow engine notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPartnerDirectory;
    use crate::ports::{DirectoryError, TransportResponse};
    use async_trait::async_trait;
    use secrecy::SecretString;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    // ══════════════════════════════════════════════════════════════
    // Test infrastructure
    // ══════════════════════════════════════════════════════════════

    /// Per-URL scripted behavior.
    #[derive(Clone)]
    enum Script {
        Ok(u16),
        Timeout,
        ConnectionError,
    }

    /// One recorded delivery.
    #[derive(Clone)]
    struct Recorded {
        url: String,
        body: String,
        headers: Vec<(String, String)>,
    }

    /// Transport that follows a per-URL script and records every request.
    struct ScriptedTransport {
        scripts: HashMap<String, Script>,
        recorded: Mutex<Vec<Recorded>>,
    }

    impl ScriptedTransport {
        fn new(scripts: &[(&str, Script)]) -> Self {
            Self {
                scripts: scripts
                    .iter()
                    .map(|(url, s)| (url.to_string(), s.clone()))
                    .collect(),
                recorded: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<Recorded> {
            self.recorded.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for ScriptedTransport {
        async fn post(
            &self,
            url: &str,
            body: &str,
            headers: &[(&str, String)],
            _timeout: Duration,
        ) -> Result<TransportResponse, crate::ports::TransportError> {
            self.recorded.lock().unwrap().push(Recorded {
                url: url.to_string(),
                body: body.to_string(),
                headers: headers
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
            });

            match self.scripts.get(url).cloned().unwrap_or(Script::Ok(200)) {
                Script::Ok(status) => Ok(TransportResponse {
                    status,
                    body_excerpt: String::new(),
                }),
                Script::Timeout => Err(TransportError::Timeout),
                Script::ConnectionError => {
                    Err(TransportError::Transport("connection refused".to_string()))
                }
            }
        }
    }

    /// Directory whose resolution always fails.
    struct BrokenDirectory;

    #[async_trait]
    impl PartnerDirectory for BrokenDirectory {
        async fn partners_for_event(
            &self,
            _event: EventType,
        ) -> Result<Vec<Partner>, DirectoryError> {
            Err(DirectoryError::Database("directory offline".to_string()))
        }

        async fn list(&self) -> Result<Vec<Partner>, DirectoryError> {
            Err(DirectoryError::Database("directory offline".to_string()))
        }

        async fn find_by_id(
            &self,
            _id: &PartnerId,
        ) -> Result<Option<Partner>, DirectoryError> {
            Ok(None)
        }

        async fn create(&self, _partner: &Partner) -> Result<(), DirectoryError> {
            Ok(())
        }

        async fn update(&self, _partner: &Partner) -> Result<(), DirectoryError> {
            Ok(())
        }

        async fn record_delivery_success(&self, _id: &PartnerId) -> Result<(), DirectoryError> {
            Ok(())
        }

        async fn record_delivery_failure(
            &self,
            _id: &PartnerId,
        ) -> Result<PartnerStatus, DirectoryError> {
            Ok(PartnerStatus::Active)
        }
    }

    fn partner(name: &str, url: &str) -> Partner {
        Partner::create(name, url, vec![EventType::All], None, None).unwrap()
    }

    fn dispatcher(
        directory: Arc<dyn PartnerDirectory>,
        transport: Arc<ScriptedTransport>,
    ) -> WebhookDispatcher {
        WebhookDispatcher::new(
            directory,
            transport,
            SignatureCodec::new(300),
            WebhookConfig::default(),
        )
    }

    fn fields(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    // ══════════════════════════════════════════════════════════════
    // Fan-out isolation
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn one_partner_timing_out_does_not_affect_the_others() {
        let directory = Arc::new(InMemoryPartnerDirectory::new(10));
        let a = partner("A", "https://a.test/hooks");
        let b = partner("B", "https://b.test/hooks");
        let c = partner("C", "https://c.test/hooks");
        for p in [&a, &b, &c] {
            directory.create(p).await.unwrap();
        }

        let transport = Arc::new(ScriptedTransport::new(&[
            ("https://a.test/hooks", Script::Ok(200)),
            ("https://b.test/hooks", Script::Timeout),
            ("https://c.test/hooks", Script::Ok(204)),
        ]));

        let report = dispatcher(directory.clone(), transport.clone())
            .dispatch(EventType::PaymentSucceeded, fields(&[("payment_id", "p1")]))
            .await;

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.delivered_count(), 2);
        assert_eq!(report.failed_count(), 1);

        let b_result = report
            .results
            .iter()
            .find(|r| r.partner_id == b.id)
            .unwrap();
        assert_eq!(b_result.outcome, DeliveryOutcome::TimedOut);

        // Bookkeeping followed the outcomes.
        assert_eq!(
            directory.find_by_id(&a.id).await.unwrap().unwrap().total_webhooks_sent,
            1
        );
        assert_eq!(
            directory.find_by_id(&b.id).await.unwrap().unwrap().consecutive_failures,
            1
        );
    }

    #[tokio::test]
    async fn rejected_and_errored_deliveries_are_classified() {
        let directory = Arc::new(InMemoryPartnerDirectory::new(10));
        let rejecting = partner("Rejecting", "https://r.test/hooks");
        let broken = partner("Broken", "https://x.test/hooks");
        directory.create(&rejecting).await.unwrap();
        directory.create(&broken).await.unwrap();

        let transport = Arc::new(ScriptedTransport::new(&[
            ("https://r.test/hooks", Script::Ok(500)),
            ("https://x.test/hooks", Script::ConnectionError),
        ]));

        let report = dispatcher(directory, transport)
            .dispatch(EventType::PaymentFailed, fields(&[]))
            .await;

        let outcome_of = |id: PartnerId| {
            report
                .results
                .iter()
                .find(|r| r.partner_id == id)
                .unwrap()
                .outcome
                .clone()
        };
        assert!(matches!(
            outcome_of(rejecting.id),
            DeliveryOutcome::Rejected { status: 500, .. }
        ));
        assert!(matches!(outcome_of(broken.id), DeliveryOutcome::Failed { .. }));
    }

    // ══════════════════════════════════════════════════════════════
    // Payload and signature
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn delivered_body_is_signed_with_the_partner_secret() {
        let directory = Arc::new(InMemoryPartnerDirectory::new(10));
        let p = partner("Signed", "https://s.test/hooks");
        let secret = SecretString::new(
            secrecy::ExposeSecret::expose_secret(p.secret()).clone(),
        );
        directory.create(&p).await.unwrap();

        let transport = Arc::new(ScriptedTransport::new(&[]));
        dispatcher(directory, transport.clone())
            .dispatch(
                EventType::PaymentSucceeded,
                fields(&[("payment_id", "p1"), ("amount", "25.00")]),
            )
            .await;

        let recorded = transport.recorded();
        assert_eq!(recorded.len(), 1);
        let delivery = &recorded[0];

        let signature = delivery
            .headers
            .iter()
            .find(|(name, _)| name == "X-Webhook-Signature")
            .map(|(_, value)| value.clone())
            .unwrap();
        let partner_header = delivery
            .headers
            .iter()
            .find(|(name, _)| name == "X-Partner-Id")
            .map(|(_, value)| value.clone())
            .unwrap();

        assert_eq!(partner_header, p.id.to_string());
        assert!(SignatureCodec::new(300).verify(&secret, delivery.body.as_bytes(), &signature));

        let body: Value = serde_json::from_str(&delivery.body).unwrap();
        assert_eq!(body["event"], "payment.succeeded");
        assert_eq!(body["amount"], "25.00");
        assert!(body["timestamp"].is_string());
    }

    // ══════════════════════════════════════════════════════════════
    // Suspension and resolution
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn suspended_partner_is_excluded_from_the_next_dispatch() {
        let directory = Arc::new(InMemoryPartnerDirectory::new(3));
        let failing = partner("Failing", "https://f.test/hooks");
        directory.create(&failing).await.unwrap();

        let transport = Arc::new(ScriptedTransport::new(&[(
            "https://f.test/hooks",
            Script::Timeout,
        )]));
        let dispatcher = dispatcher(directory.clone(), transport.clone());

        for _ in 0..3 {
            dispatcher
                .dispatch(EventType::PaymentSucceeded, fields(&[]))
                .await;
        }
        assert_eq!(
            directory.find_by_id(&failing.id).await.unwrap().unwrap().status,
            PartnerStatus::Suspended
        );

        let before = transport.recorded().len();
        let report = dispatcher
            .dispatch(EventType::PaymentSucceeded, fields(&[]))
            .await;
        assert!(report.results.is_empty());
        assert_eq!(transport.recorded().len(), before);
    }

    #[tokio::test]
    async fn directory_outage_degrades_to_zero_partners() {
        let transport = Arc::new(ScriptedTransport::new(&[]));
        let report = dispatcher(Arc::new(BrokenDirectory), transport.clone())
            .dispatch(EventType::PaymentSucceeded, fields(&[]))
            .await;

        assert!(report.results.is_empty());
        assert!(transport.recorded().is_empty());
    }

    // ══════════════════════════════════════════════════════════════
    // Workflow engine notification
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn terminal_events_notify_the_workflow_engine() {
        let directory = Arc::new(InMemoryPartnerDirectory::new(10));
        let transport = Arc::new(ScriptedTransport::new(&[]));
        let dispatcher = WebhookDispatcher::new(
            directory,
            transport.clone(),
            SignatureCodec::new(300),
            WebhookConfig {
                workflow_webhook_url: Some("https://engine.internal/hooks".to_string()),
                ..Default::default()
            },
        );

        dispatcher
            .dispatch(EventType::PaymentSucceeded, fields(&[("payment_id", "p1")]))
            .await;
        dispatcher
            .dispatch(EventType::PaymentCreated, fields(&[("payment_id", "p1")]))
            .await;

        let workflow_posts: Vec<Recorded> = transport
            .recorded()
            .into_iter()
            .filter(|r| r.url == "https://engine.internal/hooks")
            .collect();
        // Only the terminal event reaches the engine.
        assert_eq!(workflow_posts.len(), 1);
        assert!(workflow_posts[0].headers.is_empty());
    }
}
