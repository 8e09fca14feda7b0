//! B2B partner entity.
//!
//! A partner registers a webhook URL, a set of subscribed events, and holds a
//! per-partner HMAC secret. Delivery bookkeeping lives here: success resets
//! the consecutive-failure counter, failures accumulate until the partner is
//! suspended.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{PartnerId, Timestamp, ValidationError};

use super::EventType;

/// Lifecycle status of a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    /// Eligible for webhook delivery.
    Active,

    /// Opted out; never delivered to.
    Inactive,

    /// Disabled after repeated delivery failures; never delivered to.
    Suspended,
}

impl PartnerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerStatus::Active => "active",
            PartnerStatus::Inactive => "inactive",
            PartnerStatus::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registered B2B consumer of outbound event webhooks.
#[derive(Debug, Clone)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,

    /// Where signed event notifications are POSTed.
    pub webhook_url: String,

    /// Subscribed events; may contain the wildcard.
    pub events: Vec<EventType>,

    /// HMAC key for this partner's signatures. Never logged, never
    /// serialized into API responses except at issuance or rotation.
    secret: SecretString,

    pub status: PartnerStatus,

    pub description: Option<String>,
    pub contact_email: Option<String>,

    /// Total successful deliveries over the partner's lifetime.
    pub total_webhooks_sent: u64,

    /// Failures since the last success. Resets on any success.
    pub consecutive_failures: u32,

    /// When the last successful delivery happened.
    pub last_webhook_at: Option<Timestamp>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Partner {
    /// Creates a new active partner with a freshly generated secret.
    ///
    /// The webhook URL must be a well-formed http(s) URL.
    pub fn create(
        name: impl Into<String>,
        webhook_url: impl Into<String>,
        events: Vec<EventType>,
        description: Option<String>,
        contact_email: Option<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let webhook_url = webhook_url.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        validate_webhook_url(&webhook_url)?;

        let now = Timestamp::now();
        Ok(Self {
            id: PartnerId::new(),
            name,
            webhook_url,
            events,
            secret: generate_secret(),
            status: PartnerStatus::Active,
            description,
            contact_email,
            total_webhooks_sent: 0,
            consecutive_failures: 0,
            last_webhook_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reassembles a partner from stored fields (repository use).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PartnerId,
        name: String,
        webhook_url: String,
        events: Vec<EventType>,
        secret: SecretString,
        status: PartnerStatus,
        description: Option<String>,
        contact_email: Option<String>,
        total_webhooks_sent: u64,
        consecutive_failures: u32,
        last_webhook_at: Option<Timestamp>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            webhook_url,
            events,
            secret,
            status,
            description,
            contact_email,
            total_webhooks_sent,
            consecutive_failures,
            last_webhook_at,
            created_at,
            updated_at,
        }
    }

    /// The partner's HMAC secret.
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// Replaces the secret with a fresh one and returns it.
    ///
    /// The returned value is the only time the new secret leaves the entity
    /// in the clear.
    pub fn rotate_secret(&mut self) -> String {
        self.secret = generate_secret();
        self.touch();
        self.secret.expose_secret().clone()
    }

    /// True if the partner subscribed to the given event, directly or via
    /// the wildcard.
    pub fn is_subscribed_to(&self, event: EventType) -> bool {
        self.events.contains(&EventType::All) || self.events.contains(&event)
    }

    /// True only for partners that should receive deliveries.
    pub fn is_deliverable(&self) -> bool {
        self.status == PartnerStatus::Active
    }

    /// Records a successful delivery: bumps the total, clears the failure
    /// streak, stamps the delivery time.
    pub fn record_webhook_success(&mut self) {
        self.total_webhooks_sent += 1;
        self.consecutive_failures = 0;
        self.last_webhook_at = Some(Timestamp::now());
        self.touch();
    }

    /// Records a failed delivery. Once the streak reaches `threshold` the
    /// partner is suspended. Returns the resulting status.
    pub fn record_webhook_failure(&mut self, threshold: u32) -> PartnerStatus {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= threshold {
            self.status = PartnerStatus::Suspended;
        }
        self.touch();
        self.status
    }

    /// Re-activates the partner and clears the failure streak.
    pub fn activate(&mut self) {
        self.status = PartnerStatus::Active;
        self.consecutive_failures = 0;
        self.touch();
    }

    /// Deactivates the partner.
    pub fn deactivate(&mut self) {
        self.status = PartnerStatus::Inactive;
        self.touch();
    }

    /// Suspends the partner.
    pub fn suspend(&mut self) {
        self.status = PartnerStatus::Suspended;
        self.touch();
    }

    fn touch(&mut self) {
        let now = Timestamp::now();
        if now.is_after(&self.updated_at) {
            self.updated_at = now;
        }
    }
}

/// Generates a fresh `whsec_`-prefixed secret.
///
/// Two v4 UUIDs concatenated give 64 hex chars (~244 bits of entropy).
fn generate_secret() -> SecretString {
    SecretString::new(format!(
        "whsec_{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    ))
}

fn validate_webhook_url(url: &str) -> Result<(), ValidationError> {
    if url.trim().is_empty() {
        return Err(ValidationError::empty_field("webhook_url"));
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::invalid_format(
            "webhook_url",
            "must be an http(s) URL",
        )),
    }
}
