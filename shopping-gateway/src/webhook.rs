// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Webhook relay
//!
//! Best-effort delivery of sanitized item lists to the downstream webhook.
//! Delivery never fails the caller: every attempt ends in a
//! [`DeliveryOutcome`] that the endpoint logs and counts.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub items: Vec<String>,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Webhook answered with a 2xx status.
    Delivered { status: u16 },

    /// Webhook answered with a non-success status or could not be reached.
    Failed {
        status: Option<u16>,
        reason: String,
        timed_out: bool,
    },
}

impl DeliveryOutcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Failed {
                timed_out: true, ..
            } => "timeout",
            DeliveryOutcome::Failed { .. } => "failed",
        }
    }
}

/// Destination for sanitized item lists.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Deliver the payload once. Implementations must not retry.
    async fn deliver(&self, payload: &WebhookPayload) -> DeliveryOutcome;
}

/// Webhook sink posting JSON over HTTP.
#[derive(Clone)]
pub struct HttpWebhook {
    url: String,
    client: reqwest::Client,
}

impl HttpWebhook {
    /// Create a new HTTP webhook sink.
    ///
    /// # Arguments
    /// * `url` - Webhook endpoint receiving `{"items": [...]}`
    /// * `timeout` - Total request timeout (10s in production)
    pub fn new(url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self { url, client })
    }
}

#[async_trait]
impl WebhookSink for HttpWebhook {
    async fn deliver(&self, payload: &WebhookPayload) -> DeliveryOutcome {
        tracing::debug!(
            url = %self.url,
            items = payload.items.len(),
            "sending items to webhook"
        );

        let resp = match self.client.post(&self.url).json(payload).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return DeliveryOutcome::Failed {
                    status: None,
                    reason: e.to_string(),
                    timed_out: e.is_timeout(),
                }
            }
        };

        let status = resp.status();
        if status.is_success() {
            return DeliveryOutcome::Delivered {
                status: status.as_u16(),
            };
        }

        let body = resp.text().await.unwrap_or_default();
        DeliveryOutcome::Failed {
            status: Some(status.as_u16()),
            reason: body,
            timed_out: false,
        }
    }
}
