// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
mod health;
mod metrics;
mod send_items;

pub use health::{health_live, health_ready, HealthState};
pub use metrics::metrics_handler;
pub use send_items::{send_items, SubmissionState};
