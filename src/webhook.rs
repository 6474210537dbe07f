//! Webhook caller (C8): bounded-retry HTTP delivery, spec §4.8.
//!
//! The retry loop is grounded in `kafkaconsumer/internal/webhook/webhook.go`
//! (wait 1s, retry up to R times, treat only exact 200 as success); the
//! request-building style (a shared `reqwest::Client`, JSON content type)
//! follows the teacher's `webhooks.rs` dispatcher, which this otherwise
//! replaces because the teacher's version fires once and forgets instead of
//! retrying.

use crate::error::WebhookError;
use crate::ids::Handle;
use reqwest::{Client, Method};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Serialize)]
struct WebhookBody {
    chat_uuid: String,
}

pub struct WebhookConfig {
    pub method: String,
    pub url: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

pub struct WebhookCaller {
    client: Client,
    method: Method,
    url: String,
    max_retries: u32,
}

impl WebhookCaller {
    /// Builds the caller up front so request-construction errors (bad
    /// method, bad URL) surface immediately rather than on first call, per
    /// spec §4.8's "surfaces immediately, not retried".
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let method = Method::from_str(&config.method.to_uppercase())
            .map_err(|e| WebhookError::RequestConstruction(e.to_string()))?;
        reqwest::Url::parse(&config.url)
            .map_err(|e| WebhookError::RequestConstruction(e.to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WebhookError::RequestConstruction(e.to_string()))?;

        Ok(Self {
            client,
            method,
            url: config.url,
            max_retries: config.max_retries.max(1),
        })
    }

    /// Deliver `chat` to the configured endpoint, retrying on network
    /// error or any non-200 response with a 1s backoff, up to
    /// `max_retries` attempts.
    pub async fn deliver(&self, chat: Handle) -> Result<(), WebhookError> {
        let body = WebhookBody {
            chat_uuid: chat.to_string(),
        };

        for attempt in 1..=self.max_retries {
            let result = self
                .client
                .request(self.method.clone(), &self.url)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().as_u16() == 200 => return Ok(()),
                Ok(resp) => warn!(
                    %chat,
                    attempt,
                    status = resp.status().as_u16(),
                    "webhook delivery got non-200 response"
                ),
                Err(err) => warn!(%chat, attempt, error = %err, "webhook delivery failed"),
            }

            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        Err(WebhookError::RetriesExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_method_is_rejected_at_construction() {
        let err = WebhookCaller::new(WebhookConfig {
            method: "NOT A METHOD".into(),
            url: "http://localhost:9999/hook".into(),
            max_retries: 3,
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        assert!(matches!(err, WebhookError::RequestConstruction(_)));
    }

    #[test]
    fn bad_url_is_rejected_at_construction() {
        let err = WebhookCaller::new(WebhookConfig {
            method: "POST".into(),
            url: "not a url".into(),
            max_retries: 3,
            timeout: Duration::from_secs(1),
        })
        .unwrap_err();
        assert!(matches!(err, WebhookError::RequestConstruction(_)));
    }

    #[tokio::test]
    async fn retries_exceeded_when_endpoint_unreachable() {
        let caller = WebhookCaller::new(WebhookConfig {
            method: "POST".into(),
            // Port 1 is reserved and should refuse connections immediately.
            url: "http://127.0.0.1:1/hook".into(),
            max_retries: 2,
            timeout: Duration::from_millis(200),
        })
        .unwrap();

        let err = caller.deliver(Handle::new()).await.unwrap_err();
        assert!(matches!(err, WebhookError::RetriesExceeded));
    }
}
