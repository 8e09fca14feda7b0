//! Stripe payment provider adapter.
//!
//! Integrates with Stripe Checkout over its REST API: payments are created
//! as Checkout Sessions and the payer is redirected to the hosted page.
//! Inbound webhook signatures use the shared `t=...,v1=...` HMAC scheme.
//!
//! # Security
//!
//! - API key and webhook secret held as `secrecy::SecretString`
//! - Webhook verification is constant-time with a replay window

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::payment::PaymentStatus;
use crate::domain::webhook::SignatureCodec;
use crate::ports::{
    PaymentIntent, PaymentIntentRequest, PaymentProvider, ProviderError, RefundOutcome,
};

/// Fixed mapping from Checkout Session status to [`PaymentStatus`].
static SESSION_STATUS_TABLE: Lazy<HashMap<&'static str, PaymentStatus>> = Lazy::new(|| {
    HashMap::from([
        ("open", PaymentStatus::Pending),
        ("complete", PaymentStatus::Succeeded),
        ("expired", PaymentStatus::Canceled),
    ])
});

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    pub secret_key: SecretString,

    /// Webhook signing secret (whsec_...).
    pub webhook_secret: SecretString,

    /// Base URL for the Stripe API.
    pub api_base_url: String,

    /// Redirect targets used when the caller supplies none.
    pub success_url: String,
    pub cancel_url: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl StripeConfig {
    /// Creates a configuration against the public Stripe API.
    pub fn new(secret_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            secret_key,
            webhook_secret,
            api_base_url: "https://api.stripe.com".to_string(),
            success_url: String::new(),
            cancel_url: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Overrides the API base URL (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the default redirect targets.
    pub fn with_redirects(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }
}

/// Stripe payment provider.
pub struct StripeProvider {
    config: StripeConfig,
    codec: SignatureCodec,
    http: reqwest::Client,
}

/// Checkout Session as returned by the Stripe API (fields we read).
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeRefund {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl StripeProvider {
    /// Creates a Stripe provider with the given configuration and signature
    /// codec.
    pub fn new(config: StripeConfig, codec: SignatureCodec) -> Self {
        Self {
            config,
            codec,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Sends a request and decodes the response, mapping Stripe failures
    /// onto [`ProviderError`].
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request
            .bearer_auth(self.config.secret_key.expose_secret())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ProviderError::Authentication(format!(
                "Stripe rejected the API key (HTTP {status})"
            )));
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<StripeErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(StripeErrorDetail {
                message: None,
                code: None,
            });

        Err(ProviderError::Api {
            message: detail
                .message
                .unwrap_or_else(|| format!("Stripe returned HTTP {status}")),
            provider_code: detail.code,
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, ProviderError> {
        let unit_amount = minor_units(request.amount)?;

        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "line_items[0][price_data][currency]".into(),
                request.currency.code().into(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                unit_amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                request.description.clone().unwrap_or_else(|| "Payment".into()),
            ),
            (
                "success_url".into(),
                request
                    .success_url
                    .unwrap_or_else(|| self.config.success_url.clone()),
            ),
            (
                "cancel_url".into(),
                request
                    .cancel_url
                    .unwrap_or_else(|| self.config.cancel_url.clone()),
            ),
        ];
        if let Some(email) = &request.payer_email {
            form.push(("customer_email".into(), email.clone()));
        }
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let session: StripeSession = self
            .execute(self.http.post(self.url("/v1/checkout/sessions")).form(&form))
            .await?;

        tracing::info!(session_id = %session.id, "Created Stripe checkout session");

        Ok(PaymentIntent {
            provider_payment_id: session.id,
            // Checkout flow, not Elements: there is no client secret.
            client_secret: None,
            checkout_url: session.url,
            status: PaymentStatus::Pending,
        })
    }

    async fn verify_payment(
        &self,
        provider_payment_id: &str,
    ) -> Result<PaymentStatus, ProviderError> {
        let session: StripeSession = self
            .execute(
                self.http
                    .get(self.url(&format!("/v1/checkout/sessions/{provider_payment_id}"))),
            )
            .await?;

        Ok(map_session_status(session.status.as_deref()))
    }

    async fn cancel_payment(&self, provider_payment_id: &str) -> Result<bool, ProviderError> {
        let result: Result<StripeSession, ProviderError> = self
            .execute(self.http.post(self.url(&format!(
                "/v1/checkout/sessions/{provider_payment_id}/expire"
            ))))
            .await;

        match result {
            Ok(_) => Ok(true),
            // Only open sessions can be expired; a completed or already
            // expired session is reported as not-canceled, not an error.
            Err(ProviderError::Api { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn refund_payment(
        &self,
        provider_payment_id: &str,
        amount: Option<Decimal>,
    ) -> Result<RefundOutcome, ProviderError> {
        let session: StripeSession = self
            .execute(
                self.http
                    .get(self.url(&format!("/v1/checkout/sessions/{provider_payment_id}"))),
            )
            .await?;

        let payment_intent = match session.payment_intent {
            Some(id) => id,
            None => {
                return Ok(RefundOutcome::refused(
                    "no payment intent found for this session",
                ))
            }
        };

        let mut form: Vec<(String, String)> =
            vec![("payment_intent".into(), payment_intent)];
        if let Some(amount) = amount {
            form.push(("amount".into(), minor_units(amount)?.to_string()));
        }

        let result: Result<StripeRefund, ProviderError> = self
            .execute(self.http.post(self.url("/v1/refunds")).form(&form))
            .await;

        match result {
            Ok(refund) => Ok(RefundOutcome::succeeded(refund.id)),
            // Business-rule refusal (already refunded, charge disputed, ...).
            Err(ProviderError::Api { message, .. }) => Ok(RefundOutcome::refused(message)),
            Err(err) => Err(err),
        }
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        self.codec
            .verify(&self.config.webhook_secret, payload, signature)
    }
}

/// Maps a Checkout Session status onto the canonical set. Unknown statuses
/// read as PENDING rather than failing the sync.
fn map_session_status(status: Option<&str>) -> PaymentStatus {
    status
        .and_then(|s| SESSION_STATUS_TABLE.get(s).copied())
        .unwrap_or(PaymentStatus::Pending)
}

/// Converts a major-unit amount to Stripe's minor units (cents).
fn minor_units(amount: Decimal) -> Result<i64, ProviderError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .filter(|cents| *cents > 0)
        .ok_or_else(|| ProviderError::Api {
            message: format!("amount '{amount}' is not chargeable"),
            provider_code: None,
        })
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Network("request to Stripe timed out".to_string())
    } else {
        ProviderError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn provider() -> StripeProvider {
        let config = StripeConfig::new(secret("sk_test_xxx"), secret("whsec_stripe_test"))
            .with_redirects("https://app.test/success", "https://app.test/cancel");
        StripeProvider::new(config, SignatureCodec::new(300))
    }

    // ══════════════════════════════════════════════════════════════
    // Status table
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn session_statuses_map_deterministically() {
        assert_eq!(map_session_status(Some("open")), PaymentStatus::Pending);
        assert_eq!(map_session_status(Some("complete")), PaymentStatus::Succeeded);
        assert_eq!(map_session_status(Some("expired")), PaymentStatus::Canceled);
    }

    #[test]
    fn unknown_statuses_read_as_pending() {
        assert_eq!(map_session_status(Some("mystery")), PaymentStatus::Pending);
        assert_eq!(map_session_status(None), PaymentStatus::Pending);
    }

    // ══════════════════════════════════════════════════════════════
    // Amount conversion
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn amounts_convert_to_minor_units() {
        assert_eq!(minor_units("25.00".parse().unwrap()).unwrap(), 2500);
        assert_eq!(minor_units("0.50".parse().unwrap()).unwrap(), 50);
        assert_eq!(minor_units("1234.56".parse().unwrap()).unwrap(), 123456);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        assert!(minor_units("0".parse().unwrap()).is_err());
        assert!(minor_units("-5.00".parse().unwrap()).is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Webhook signatures
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn webhook_signature_roundtrips_with_the_configured_secret() {
        let provider = provider();
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let header = SignatureCodec::new(300).sign(&secret("whsec_stripe_test"), payload);

        assert!(provider.verify_webhook_signature(payload.as_bytes(), &header));
    }

    #[test]
    fn webhook_signature_with_wrong_secret_fails() {
        let provider = provider();
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let header = SignatureCodec::new(300).sign(&secret("whsec_other"), payload);

        assert!(!provider.verify_webhook_signature(payload.as_bytes(), &header));
    }

    #[test]
    fn malformed_signature_header_fails_quietly() {
        let provider = provider();
        assert!(!provider.verify_webhook_signature(b"{}", "not-a-header"));
    }
}
