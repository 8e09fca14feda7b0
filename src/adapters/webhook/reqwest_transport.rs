//! HTTP webhook transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{TransportError, TransportResponse, WebhookTransport};

/// How much of a response body is kept for failure diagnostics.
const BODY_EXCERPT_LEN: usize = 200;

/// Delivers webhook requests over HTTP.
#[derive(Default)]
pub struct ReqwestWebhookTransport {
    client: reqwest::Client,
}

impl ReqwestWebhookTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookTransport for ReqwestWebhookTransport {
    async fn post(
        &self,
        url: &str,
        body: &str,
        headers: &[(&str, String)],
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self
            .client
            .post(url)
            .timeout(timeout)
            .header("Content-Type", "application/json")
            .body(body.to_string());

        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Transport(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let body_excerpt = body.chars().take(BODY_EXCERPT_LEN).collect();

        Ok(TransportResponse {
            status,
            body_excerpt,
        })
    }
}
