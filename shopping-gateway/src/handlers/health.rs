// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared application state for health endpoints.
#[derive(Clone, Default)]
pub struct HealthState {
    /// Flag indicating if we're shutting down
    pub shutting_down: Arc<AtomicBool>,
}

/// Health check response body.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is alive.
///
/// # Endpoint
/// `GET /health/live`
pub async fn health_live() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

/// Readiness probe endpoint.
///
/// Returns 503 once graceful shutdown has started so load balancers drain
/// traffic before the listener closes.
///
/// # Endpoint
/// `GET /health/ready`
pub async fn health_ready(State(state): State<HealthState>) -> Response {
    if state.shutting_down.load(Ordering::SeqCst) {
        let response = HealthResponse {
            status: "shutting_down",
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response();
    }

    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}
