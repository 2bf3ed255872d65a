// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers::{
    health_live, health_ready, metrics_handler, send_items, HealthState, SubmissionState,
};

/// Build the application router.
pub fn build_router(submission: SubmissionState, health: HealthState) -> Router {
    let metrics = submission.metrics.clone();

    // A panicking submission still counts towards the outcome metrics
    let submit_metrics = metrics.clone();
    let submit = post(send_items)
        .with_state(submission)
        .layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| {
                submit_metrics.record_submission(ApiError::Internal.outcome());
                panic_response(err)
            },
        ));

    Router::new()
        .route("/api/send-items", submit)
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready).with_state(health))
        .route("/metrics", get(metrics_handler).with_state(metrics))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Map a handler panic to a generic 500 without leaking details.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "request handler panicked");

    ApiError::Internal.into_response()
}
