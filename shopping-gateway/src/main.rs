// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod client_id;
mod config;
mod error;
mod handlers;
mod metrics;
mod rate_limit;
mod sanitize;
#[cfg(test)]
mod test_logs;
mod webhook;

use config::{Config, ConfigError};
use handlers::{HealthState, SubmissionState};
use metrics::Metrics;
use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
use webhook::HttpWebhook;

#[tokio::main]
async fn main() -> Result<()> {
    // Fail fast: a missing secret is an operator error
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Configured tracing needs the config, so report through a plain stderr subscriber
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .init();
            report_config_error(&e);
            return Err(e.into());
        }
    };

    init_tracing(&config);

    tracing::info!(
        host = %config.host,
        port = config.port,
        env = config.app_env.as_str(),
        webhook_url = %config.webhook_url,
        webhook_timeout_secs = config.webhook_timeout_secs,
        rate_limit = config.rate_limit_max_requests,
        rate_limit_window_secs = config.rate_limit_window_secs,
        "starting shopping-gateway"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let shutting_down = Arc::new(AtomicBool::new(false));

    let metrics = Metrics::new()?;

    let limiter = InMemoryRateLimiter::with_config(RateLimitConfig {
        max_requests: config.rate_limit_max_requests,
        window: chrono::Duration::seconds(i64::try_from(config.rate_limit_window_secs)?),
    });

    let webhook = HttpWebhook::new(
        config.webhook_url.clone(),
        Duration::from_secs(config.webhook_timeout_secs),
    )?;

    let submission = SubmissionState {
        password: Arc::from(config.app_password.as_str()),
        limiter: Arc::new(limiter),
        webhook: Arc::new(webhook),
        metrics,
    };
    let health = HealthState {
        shutting_down: Arc::clone(&shutting_down),
    };

    let app = app::build_router(submission, health);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "listening for connections");

    // Spawn graceful shutdown handler
    let shutdown_tx_clone = shutdown_tx.clone();
    let shutting_down_clone = Arc::clone(&shutting_down);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, initiating graceful shutdown");

        // Readiness reports not ready from here on
        shutting_down_clone.store(true, Ordering::SeqCst);

        let _ = shutdown_tx_clone.send(());
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_tx.subscribe();
            let _ = rx.recv().await;
        })
        .await?;

    tracing::info!("shopping-gateway stopped");
    Ok(())
}

fn report_config_error(err: &ConfigError) {
    tracing::error!(error = %err, "environment variable validation failed");
}

/// Initialize tracing based on configuration.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
