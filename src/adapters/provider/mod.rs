//! Payment provider adapters.
//!
//! Two implementations of the `PaymentProvider` port: the Stripe integration
//! and a deterministic in-process provider. The active one is selected once
//! at startup from configuration.

mod mock;
mod stripe;

pub use mock::MockProvider;
pub use stripe::{StripeConfig, StripeProvider};

use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderKind, WebhookConfig};
use crate::domain::webhook::SignatureCodec;
use crate::ports::PaymentProvider;

/// Builds the payment provider selected by configuration.
pub fn build_provider(
    provider: &ProviderConfig,
    webhook: &WebhookConfig,
) -> Arc<dyn PaymentProvider> {
    let codec = SignatureCodec::new(webhook.replay_window_secs);
    match provider.kind {
        ProviderKind::Stripe => {
            let config = StripeConfig::new(
                provider.stripe_secret_key.clone(),
                provider.stripe_webhook_secret.clone(),
            )
            .with_redirects(provider.success_url.clone(), provider.cancel_url.clone());
            Arc::new(StripeProvider::new(config, codec))
        }
        ProviderKind::Mock => Arc::new(MockProvider::new(
            provider.mock_webhook_secret.clone(),
            provider.checkout_base_url.clone(),
            codec,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_kind_builds_the_mock_provider() {
        let provider = build_provider(&ProviderConfig::default(), &WebhookConfig::default());
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn stripe_kind_builds_the_stripe_provider() {
        let config = ProviderConfig {
            kind: ProviderKind::Stripe,
            ..Default::default()
        };
        let provider = build_provider(&config, &WebhookConfig::default());
        assert_eq!(provider.name(), "stripe");
    }
}
