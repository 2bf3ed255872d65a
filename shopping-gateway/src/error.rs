// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to callers of the submission endpoint.
///
/// Webhook delivery problems are deliberately absent: they are absorbed at
/// the endpoint boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Invalid password")]
    Unauthorized,

    #[error("Too many requests")]
    RateLimited { retry_after_seconds: i64 },

    #[error("Internal server error")]
    Internal,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn missing_fields() -> Self {
        ApiError::Validation("Password and items are required")
    }

    pub fn malformed_items() -> Self {
        ApiError::Validation("Items must be an array")
    }

    pub fn invalid_json() -> Self {
        ApiError::Validation("Invalid JSON body")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label for this error.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "invalid",
            ApiError::Unauthorized => "unauthorized",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Internal => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        match self {
            ApiError::RateLimited {
                retry_after_seconds,
            } => {
                let retry_after = HeaderValue::from(retry_after_seconds.max(1));
                (status, [(header::RETRY_AFTER, retry_after)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
