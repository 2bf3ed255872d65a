// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Client-side credential persistence
//!
//! Cookie-like key/value storage with per-entry expiry. The form controller
//! only ever writes the shared password, and only after a successful
//! submission.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Key under which the password is stored.
pub const PASSWORD_KEY: &str = "shopping_password";

/// Lifetime of a stored password.
pub fn password_ttl() -> Duration {
    Duration::days(30)
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Key/value persistence with expiry.
pub trait CredentialStore: Send + Sync {
    /// Read a value. Expired entries read as absent.
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    /// Write a value that expires after `ttl`.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CredentialError>;

    fn remove(&self, key: &str) -> Result<(), CredentialError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredValue {
    fn live_value(&self, now: DateTime<Utc>) -> Option<&str> {
        (self.expires_at > now).then_some(self.value.as_str())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store, used by tests and embedders.
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read as of an explicit instant.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .and_then(|v| v.live_value(now))
            .map(str::to_string)
    }

    /// Write as of an explicit instant.
    pub fn set_at(&self, key: &str, value: &str, ttl: Duration, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.get_at(key, Utc::now()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CredentialError> {
        self.set_at(key, value, ttl, Utc::now());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// File store
// =============================================================================

/// JSON file store used by the CLI.
///
/// The file maps keys to `{ "value", "expires_at" }`. Expired entries are
/// dropped the next time the file is written.
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, StoredValue>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`load`](Self::load), but a malformed file reads as empty so the
    /// next write replaces it.
    fn load_for_update(&self) -> Result<HashMap<String, StoredValue>, CredentialError> {
        match self.load() {
            Err(CredentialError::Format(e)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "discarding malformed credential file"
                );
                Ok(HashMap::new())
            }
            other => other,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write through a sibling temp file and rename it into place.
    fn save(&self, entries: &HashMap<String, StoredValue>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_vec_pretty(entries)?;
        let tmp = self.temp_path();

        // A leftover temp file may carry other permissions
        match fs::remove_file(&tmp) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp)?;
        file.write_all(&raw)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.load()?;
        Ok(entries
            .get(key)
            .and_then(|v| v.live_value(Utc::now()))
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        let mut entries = self.load_for_update()?;
        entries.retain(|_, v| v.expires_at > now);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.load_for_update()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
