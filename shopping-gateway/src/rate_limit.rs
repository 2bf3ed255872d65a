// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Rate Limiting
//!
//! Per-client sliding window limiter for the submission endpoint.
//!
//! Defaults:
//! - 5 requests per client identifier
//! - trailing 60 second window
//!
//! State is process-local and resets on restart.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

// =============================================================================
// Rate Limit Result
// =============================================================================

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Current count in the window
    pub current: u32,

    /// Maximum allowed in the window
    pub limit: u32,

    /// When the oldest counted request leaves the window
    pub reset_at: DateTime<Utc>,

    /// Time until reset in seconds
    pub retry_after_seconds: i64,
}

impl RateLimitResult {
    fn allowed(current: u32, limit: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            current,
            limit,
            reset_at,
            retry_after_seconds: 0,
        }
    }

    fn denied(current: u32, limit: u32, reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        // Round up so a client never retries a fraction of a second too early.
        let remaining = reset_at - now;
        let mut retry_after = remaining.num_seconds();
        if remaining > Duration::seconds(retry_after) {
            retry_after += 1;
        }
        Self {
            allowed: false,
            current,
            limit,
            reset_at,
            retry_after_seconds: retry_after.max(1),
        }
    }
}

// =============================================================================
// Rate Limit Bucket
// =============================================================================

/// A sliding window rate limit bucket.
#[derive(Debug, Clone, Default)]
struct RateBucket {
    /// Request timestamps, oldest first
    timestamps: Vec<DateTime<Utc>>,
}

impl RateBucket {
    /// Check if a request is allowed and record it if so.
    ///
    /// Denied requests are not recorded.
    fn check_and_record(
        &mut self,
        now: DateTime<Utc>,
        limit: u32,
        window: Duration,
    ) -> RateLimitResult {
        let window_start = now - window;

        // Lazy prune
        self.timestamps.retain(|t| *t > window_start);

        let current = self.timestamps.len() as u32;
        let reset_at = self
            .timestamps
            .first()
            .map(|t| *t + window)
            .unwrap_or(now + window);

        if current >= limit {
            return RateLimitResult::denied(current, limit, reset_at, now);
        }

        self.timestamps.push(now);

        RateLimitResult::allowed(current + 1, limit, reset_at)
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Storage seam for rate limit state.
///
/// Injected into the handler state so the in-memory table can be swapped for
/// a shared store or a fake.
pub trait RateLimitStore: Send + Sync {
    /// Count recent requests for `client_id` and record this one if allowed.
    ///
    /// Count and record happen as one critical section.
    fn check_and_record(&self, client_id: &str) -> RateLimitResult;
}

// =============================================================================
// Rate Limiter
// =============================================================================

/// Rate limiter configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,

    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::seconds(60),
        }
    }
}

/// In-memory rate limiter keyed by client identifier.
///
/// One global lock covers the whole table; throughput is low enough that
/// per-key locking buys nothing.
pub struct InMemoryRateLimiter {
    /// client_id -> bucket
    buckets: Mutex<HashMap<String, RateBucket>>,

    config: RateLimitConfig,
}

impl InMemoryRateLimiter {
    /// Create a new rate limiter with default config.
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    /// Create a rate limiter with custom config.
    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Check and record at an explicit instant.
    pub fn check_and_record_at(&self, client_id: &str, now: DateTime<Utc>) -> RateLimitResult {
        let mut buckets = self.lock();
        let bucket = buckets.entry(client_id.to_string()).or_default();
        bucket.check_and_record(now, self.config.max_requests, self.config.window)
    }


    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateBucket>> {
        // A panic while holding the lock leaves timestamps consistent, so the
        // poisoned table is still usable.
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RateLimitStore for InMemoryRateLimiter {
    fn check_and_record(&self, client_id: &str) -> RateLimitResult {
        self.check_and_record_at(client_id, Utc::now())
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
