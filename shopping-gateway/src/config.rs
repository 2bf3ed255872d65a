// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use serde::Deserialize;
use thiserror::Error;

/// Runtime environment mode.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
            AppEnv::Test => "test",
        }
    }
}

/// Configuration loaded from environment variables.
///
/// All configuration is externalized to support 12-factor app deployment.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared password every submission must present (required)
    #[serde(default)]
    pub app_password: String,

    /// Environment mode (default: development)
    #[serde(default)]
    pub app_env: AppEnv,

    /// Downstream webhook receiving sanitized item lists
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    /// Webhook request timeout in seconds (default: 10)
    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// Requests allowed per client within the window (default: 5)
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate limit window in seconds (default: 60)
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty" (default: json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Startup configuration failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment: {0}")]
    Env(#[from] envy::Error),

    #[error("APP_PASSWORD is required")]
    MissingPassword,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{name} must be at most {max}")]
    OutOfRange { name: &'static str, max: u64 },
}

/// Longest accepted rate limit window (one day).
pub const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Longest accepted webhook timeout.
pub const MAX_WEBHOOK_TIMEOUT_SECS: u64 = 300;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_url() -> String {
    "https://n8n.smallpiece.jp/webhook/22c982ed-e621-45a3-b388-9cec1ff9b5ee".to_string()
}

fn default_webhook_timeout() -> u64 {
    10
}

fn default_rate_limit_max_requests() -> u32 {
    5
}

fn default_rate_limit_window() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are uppercase with underscore separators.
    /// Example: `APP_PASSWORD`, `WEBHOOK_URL`, `LOG_LEVEL`, etc.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.app_password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        if self.rate_limit_max_requests == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_MAX_REQUESTS"));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_WINDOW_SECS"));
        }
        if self.rate_limit_window_secs > MAX_RATE_LIMIT_WINDOW_SECS {
            return Err(ConfigError::OutOfRange {
                name: "RATE_LIMIT_WINDOW_SECS",
                max: MAX_RATE_LIMIT_WINDOW_SECS,
            });
        }
        if self.webhook_timeout_secs == 0 {
            return Err(ConfigError::Zero("WEBHOOK_TIMEOUT_SECS"));
        }
        if self.webhook_timeout_secs > MAX_WEBHOOK_TIMEOUT_SECS {
            return Err(ConfigError::OutOfRange {
                name: "WEBHOOK_TIMEOUT_SECS",
                max: MAX_WEBHOOK_TIMEOUT_SECS,
            });
        }
        Ok(())
    }
}
