//! Outbound webhook configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration for partner webhook delivery and signature verification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Per-delivery HTTP timeout in seconds.
    #[serde(default = "default_delivery_timeout")]
    pub delivery_timeout_secs: u64,

    /// Consecutive failures before a partner is suspended.
    #[serde(default = "default_suspension_threshold")]
    pub suspension_threshold: u32,

    /// Maximum age (either direction) of a signed payload in seconds.
    #[serde(default = "default_replay_window")]
    pub replay_window_secs: i64,

    /// Internal workflow engine endpoint notified on terminal payment
    /// events. Delivery is best-effort; unset disables the notification.
    pub workflow_webhook_url: Option<String>,
}

impl WebhookConfig {
    /// Delivery timeout as a Duration.
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.suspension_threshold == 0 {
            return Err(ValidationError::InvalidSuspensionThreshold);
        }
        if self.replay_window_secs < 1 {
            return Err(ValidationError::InvalidReplayWindow);
        }
        if self.delivery_timeout_secs == 0 || self.delivery_timeout_secs > 120 {
            return Err(ValidationError::InvalidDeliveryTimeout);
        }
        if let Some(url) = &self.workflow_webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidWorkflowUrl);
            }
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_secs: default_delivery_timeout(),
            suspension_threshold: default_suspension_threshold(),
            replay_window_secs: default_replay_window(),
            workflow_webhook_url: None,
        }
    }
}

fn default_delivery_timeout() -> u64 {
    10
}

fn default_suspension_threshold() -> u32 {
    10
}

fn default_replay_window() -> i64 {
    300
}
