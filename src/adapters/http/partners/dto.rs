//! HTTP DTOs for partner endpoints.
//!
//! The partner secret appears in exactly two responses: creation and
//! rotation. Every other shape omits it.

use serde::{Deserialize, Serialize};

use crate::domain::partner::{EventType, Partner, PartnerStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to register a partner.
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerCreateRequest {
    pub name: String,
    pub webhook_url: String,
    pub events: Vec<EventType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

/// Request to send a signed test webhook to an arbitrary URL.
#[derive(Debug, Clone, Deserialize)]
pub struct TestWebhookRequest {
    pub webhook_url: String,
    pub event_type: EventType,

    /// Secret to sign with; generated when omitted.
    #[serde(default)]
    pub secret: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Partner details without the secret.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerResponse {
    pub id: String,
    pub name: String,
    pub webhook_url: String,
    pub events: Vec<EventType>,
    pub status: PartnerStatus,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub total_webhooks_sent: u64,
    pub consecutive_failures: u32,
    pub last_webhook_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Partner> for PartnerResponse {
    fn from(partner: Partner) -> Self {
        Self {
            id: partner.id.to_string(),
            name: partner.name,
            webhook_url: partner.webhook_url,
            events: partner.events,
            status: partner.status,
            description: partner.description,
            contact_email: partner.contact_email,
            total_webhooks_sent: partner.total_webhooks_sent,
            consecutive_failures: partner.consecutive_failures,
            last_webhook_at: partner.last_webhook_at.map(|ts| ts.to_rfc3339()),
            created_at: partner.created_at.to_rfc3339(),
            updated_at: partner.updated_at.to_rfc3339(),
        }
    }
}

/// Response at partner creation; the only time the initial secret is shown.
#[derive(Debug, Clone, Serialize)]
pub struct PartnerCreatedResponse {
    #[serde(flatten)]
    pub partner: PartnerResponse,
    pub secret: String,
}

/// Response after rotating a partner secret.
#[derive(Debug, Clone, Serialize)]
pub struct SecretRotatedResponse {
    pub partner_id: String,
    pub secret: String,
}

/// Result of a test webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct TestWebhookResponse {
    pub success: bool,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    pub error: Option<String>,
    pub signature_sent: String,
}
