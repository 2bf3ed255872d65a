// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Submission client
//!
//! One synchronous exchange with `POST /api/send-items`. No retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Path of the submission endpoint relative to the server base URL.
pub const SEND_ITEMS_PATH: &str = "/api/send-items";

/// Fallback message when an error response has no readable JSON body.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Submission payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendItemsRequest {
    pub password: String,
    pub items: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Server answered with a non-success status.
    #[error("server rejected submission with status {status}")]
    Rejected {
        status: u16,
        /// `error` field of the response body, when present and non-empty
        message: Option<String>,
    },

    /// Request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),
}

/// Transport for submissions.
#[async_trait]
pub trait SubmitApi: Send + Sync {
    async fn send_items(&self, request: &SendItemsRequest) -> Result<(), SubmitError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP implementation of [`SubmitApi`].
#[derive(Clone)]
pub struct HttpSubmitApi {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSubmitApi {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SEND_ITEMS_PATH),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SubmitApi for HttpSubmitApi {
    async fn send_items(&self, request: &SendItemsRequest) -> Result<(), SubmitError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            items = request.items.len(),
            "submitting items"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error.filter(|m| !m.is_empty()),
            Err(_) => Some(UNKNOWN_ERROR.to_string()),
        };

        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
