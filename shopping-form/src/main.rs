// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Shopping list CLI
//!
//! Command-line front-end for the form controller: check catalog items or
//! add custom ones, then send them to the gateway.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shopping_form::catalog::is_default_item;
use shopping_form::{
    FileCredentialStore, FormController, HttpSubmitApi, Locale, NoticeKind, SubmitOutcome,
    DEFAULT_ITEMS,
};

#[derive(Parser, Debug)]
#[command(name = "shopping-form")]
#[command(version)]
#[command(about = "Send a shopping list to the family gateway", long_about = None)]
struct Args {
    /// Gateway base URL
    #[arg(long, env = "SHOPPING_SERVER", default_value = "http://localhost:8080")]
    server: String,

    /// Shared password (falls back to the stored one)
    #[arg(short, long, env = "SHOPPING_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Item to send; catalog items are checked, anything else is added
    #[arg(short, long = "item")]
    items: Vec<String>,

    /// Credential file
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Message language
    #[arg(long, default_value = "ja")]
    locale: Locale,

    /// Print the default catalog and exit
    #[arg(long)]
    list: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn default_credentials_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("shopping-form")
        .join("credentials.json")
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    if args.list {
        for item in DEFAULT_ITEMS {
            println!("{}", item);
        }
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let api = HttpSubmitApi::new(&args.server).context("failed to build HTTP client")?;
    let store = FileCredentialStore::new(
        args.credentials
            .clone()
            .unwrap_or_else(default_credentials_path),
    );
    tracing::debug!(
        server = %api.endpoint(),
        credentials = %store.path().display(),
        "starting"
    );

    let mut form = FormController::new(Arc::new(api), Arc::new(store), args.locale);
    form.load();
    if let Some(password) = args.password {
        form.set_password(password);
    }
    if form.password().is_empty() {
        anyhow::bail!("no password given and none stored; use --password");
    }

    for item in &args.items {
        let item = item.trim();
        if is_default_item(item) {
            form.set_checked(item, true);
            continue;
        }
        form.set_pending_item(item);
        if let Err(e) = form.add_custom_item() {
            tracing::warn!(item = %item, error = %e, "skipping item");
        }
    }

    let outcome = form.submit().await;
    if let Some(notice) = form.visible_notice(Utc::now()) {
        match notice.kind {
            NoticeKind::Success => println!("{}", notice.message),
            NoticeKind::Error => eprintln!("{}", notice.message),
        }
    }

    Ok(match outcome {
        SubmitOutcome::Sent => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
