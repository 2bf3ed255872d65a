// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Shopping list submission endpoint.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::client_id::ClientId;
use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::rate_limit::RateLimitStore;
use crate::sanitize::sanitize_items;
use crate::webhook::{DeliveryOutcome, WebhookPayload, WebhookSink};

/// Shared state for the submission endpoint.
#[derive(Clone)]
pub struct SubmissionState {
    /// Shared secret every submission must present
    pub password: Arc<str>,
    /// Per-client rate limit table
    pub limiter: Arc<dyn RateLimitStore>,
    /// Downstream destination
    pub webhook: Arc<dyn WebhookSink>,
    pub metrics: Metrics,
}

/// Success response body.
#[derive(Debug, Serialize)]
pub struct SendItemsResponse {
    status: &'static str,
}

impl SendItemsResponse {
    fn success() -> Self {
        Self { status: "success" }
    }
}

/// Accept a shopping list and relay it to the webhook.
///
/// Steps, each short-circuiting: rate limit, presence, password, shape,
/// sanitize, forward. Forwarding failures are logged and the caller still
/// gets `{"status":"success"}`.
///
/// # Endpoint
/// `POST /api/send-items`
pub async fn send_items(
    State(state): State<SubmissionState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client = ClientId::from_headers(&headers);

    match process(&state, &client, &body).await {
        Ok(response) => {
            state.metrics.record_submission("success");
            Json(response).into_response()
        }
        Err(err) => {
            tracing::info!(
                client = %client.as_str(),
                status = err.status().as_u16(),
                error = %err,
                "submission rejected"
            );
            state.metrics.record_submission(err.outcome());
            err.into_response()
        }
    }
}

async fn process(
    state: &SubmissionState,
    client: &ClientId,
    body: &[u8],
) -> Result<SendItemsResponse, ApiError> {
    let limit = state.limiter.check_and_record(client.as_str());
    if !limit.allowed {
        tracing::warn!(
            client = %client.as_str(),
            anonymous = client.is_anonymous(),
            current = limit.current,
            limit = limit.limit,
            retry_after_secs = limit.retry_after_seconds,
            "rate limit exceeded"
        );
        state.metrics.record_rate_limited(client.is_anonymous());
        return Err(ApiError::RateLimited {
            retry_after_seconds: limit.retry_after_seconds,
        });
    }

    let request: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "request body is not valid JSON");
        ApiError::invalid_json()
    })?;

    let password = request.get("password");
    let items = request.get("items");
    tracing::debug!(
        client = %client.as_str(),
        password_provided = is_present(password),
        items_provided = is_present(items),
        "send-items called"
    );

    let (password, items) = match (password, items) {
        (Some(p), Some(i)) if is_present(Some(p)) && is_present(Some(i)) => (p, i),
        _ => return Err(ApiError::missing_fields()),
    };

    if password.as_str() != Some(&*state.password) {
        return Err(ApiError::Unauthorized);
    }

    let items = items.as_array().ok_or_else(ApiError::malformed_items)?;
    let sanitized = sanitize_items(items);

    tracing::info!(
        client = %client.as_str(),
        received = items.len(),
        forwarded = sanitized.len(),
        "forwarding items to webhook"
    );

    let payload = WebhookPayload { items: sanitized };
    let started = Instant::now();
    let outcome = state.webhook.deliver(&payload).await;
    let elapsed = started.elapsed();
    state.metrics.record_delivery(outcome.label(), elapsed);

    match &outcome {
        DeliveryOutcome::Delivered { status } => {
            tracing::info!(
                status = *status,
                latency_ms = elapsed.as_millis() as u64,
                "webhook delivery succeeded"
            );
        }
        DeliveryOutcome::Failed {
            status,
            reason,
            timed_out,
        } => {
            tracing::warn!(
                status = ?status,
                reason = %reason,
                timed_out = *timed_out,
                latency_ms = elapsed.as_millis() as u64,
                "webhook delivery failed, continuing"
            );
        }
    }

    Ok(SendItemsResponse::success())
}

/// Presence test for a request field.
///
/// Absent, `null`, `false`, `0` and `""` count as missing; arrays and objects
/// (even empty ones) count as present.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
