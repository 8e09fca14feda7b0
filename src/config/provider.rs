//! Payment provider configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Which payment provider handles intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Stripe,
    /// Deterministic in-process provider for development and tests.
    #[default]
    Mock,
}

/// Payment provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Provider selected at startup.
    #[serde(default)]
    pub kind: ProviderKind,

    /// Stripe secret API key (sk_test_... or sk_live_...)
    #[serde(default = "default_empty_secret")]
    pub stripe_secret_key: SecretString,

    /// Stripe webhook signing secret (whsec_...)
    #[serde(default = "default_empty_secret")]
    pub stripe_webhook_secret: SecretString,

    /// Webhook secret for the mock provider.
    #[serde(default = "default_mock_webhook_secret")]
    pub mock_webhook_secret: SecretString,

    /// Base URL the mock provider uses to build checkout links.
    #[serde(default = "default_checkout_base_url")]
    pub checkout_base_url: String,

    /// Redirect after successful checkout.
    #[serde(default = "default_success_url")]
    pub success_url: String,

    /// Redirect after canceled checkout.
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

impl ProviderConfig {
    /// Check if using Stripe test mode
    pub fn is_stripe_test_mode(&self) -> bool {
        self.stripe_secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind == ProviderKind::Stripe {
            let key = self.stripe_secret_key.expose_secret();
            if key.is_empty() {
                return Err(ValidationError::MissingRequired(
                    "PAYGATE__PROVIDER__STRIPE_SECRET_KEY",
                ));
            }
            if !key.starts_with("sk_") {
                return Err(ValidationError::InvalidStripeKey);
            }
            let webhook_secret = self.stripe_webhook_secret.expose_secret();
            if !webhook_secret.starts_with("whsec_") {
                return Err(ValidationError::InvalidWebhookSecret);
            }
        }
        if !self.mock_webhook_secret.expose_secret().starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            stripe_secret_key: SecretString::new(String::new()),
            stripe_webhook_secret: SecretString::new(String::new()),
            mock_webhook_secret: default_mock_webhook_secret(),
            checkout_base_url: default_checkout_base_url(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

fn default_empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_mock_webhook_secret() -> SecretString {
    SecretString::new("whsec_mock_development_secret".to_string())
}

fn default_checkout_base_url() -> String {
    "http://localhost:4200/payment".to_string()
}

fn default_success_url() -> String {
    "http://localhost:4200/payment/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:4200/payment/cancel".to_string()
}
