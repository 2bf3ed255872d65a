// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! Form controller
//!
//! Headless state machine behind the shopping list form: selection,
//! custom items, password, submission and transient notices. Rendering is
//! left to the front-end; everything observable lives here so it can be
//! driven from tests.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{SendItemsRequest, SubmitApi, SubmitError};
use crate::catalog::is_default_item;
use crate::credential::{password_ttl, CredentialStore, PASSWORD_KEY};
use crate::messages::Locale;

/// How long a success notice stays visible.
pub fn success_notice_ttl() -> Duration {
    Duration::seconds(3)
}

/// How long an error notice stays visible.
pub fn error_notice_ttl() -> Duration {
    Duration::seconds(5)
}

// =============================================================================
// Selection
// =============================================================================

/// Insertion-ordered set of checked items.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    order: Vec<String>,
    members: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.members.contains(item)
    }

    /// Returns false if the item was already selected.
    pub fn insert(&mut self, item: &str) -> bool {
        if !self.members.insert(item.to_string()) {
            return false;
        }
        self.order.push(item.to_string());
        true
    }

    /// Returns false if the item was not selected.
    pub fn remove(&mut self, item: &str) -> bool {
        if !self.members.remove(item) {
            return false;
        }
        self.order.retain(|i| i != item);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

// =============================================================================
// Notices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient feedback shown after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// `None` stays until the next submit
    pub dismiss_at: Option<DateTime<Utc>>,
}

impl Notice {
    fn new(kind: NoticeKind, message: String, ttl: Option<Duration>) -> Self {
        Self {
            kind,
            message,
            dismiss_at: ttl.map(|ttl| Utc::now() + ttl),
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.dismiss_at.map_or(true, |at| now < at)
    }
}

// =============================================================================
// Outcomes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddItemError {
    #[error("item is empty")]
    Empty,

    #[error("item is already in the list")]
    Duplicate,

    #[error("item is part of the default catalog")]
    DefaultItem,
}

/// What a call to [`FormController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Server accepted the list; state was reset.
    Sent,
    /// Nothing selected; no request made.
    EmptySelection,
    /// Server answered with an error status.
    Rejected { status: u16 },
    /// Request could not be completed.
    Failed,
    /// Another submission is in flight; no request made.
    AlreadySubmitting,
}

/// Clears the submitting flag on every exit path, including cancellation.
struct SubmittingGuard {
    flag: Arc<AtomicBool>,
}

impl SubmittingGuard {
    fn try_raise(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Shopping list form state.
pub struct FormController {
    password: String,
    selection: Selection,
    custom_items: Vec<String>,
    pending_item: String,
    notice: Option<Notice>,
    submitting: Arc<AtomicBool>,
    locale: Locale,
    api: Arc<dyn SubmitApi>,
    credentials: Arc<dyn CredentialStore>,
}

impl FormController {
    pub fn new(
        api: Arc<dyn SubmitApi>,
        credentials: Arc<dyn CredentialStore>,
        locale: Locale,
    ) -> Self {
        Self {
            password: String::new(),
            selection: Selection::new(),
            custom_items: Vec::new(),
            pending_item: String::new(),
            notice: None,
            submitting: Arc::new(AtomicBool::new(false)),
            locale,
            api,
            credentials,
        }
    }

    /// Prefill the password from a previously persisted credential.
    ///
    /// Returns true when a stored password was found.
    pub fn load(&mut self) -> bool {
        match self.credentials.get(PASSWORD_KEY) {
            Ok(Some(saved)) if !saved.is_empty() => {
                debug!("prefilled password from credential store");
                self.password = saved;
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "failed to read stored password");
                false
            }
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    // -- selection ----------------------------------------------------------

    pub fn is_checked(&self, item: &str) -> bool {
        self.selection.contains(item)
    }

    /// Check or uncheck an item.
    pub fn set_checked(&mut self, item: &str, checked: bool) {
        if checked {
            self.selection.insert(item);
        } else {
            self.selection.remove(item);
        }
    }

    /// Flip an item's checked state. Returns the new state.
    pub fn toggle(&mut self, item: &str) -> bool {
        let checked = !self.is_checked(item);
        self.set_checked(item, checked);
        checked
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    // -- custom items -------------------------------------------------------

    pub fn custom_items(&self) -> &[String] {
        &self.custom_items
    }

    pub fn pending_item(&self) -> &str {
        &self.pending_item
    }

    pub fn set_pending_item(&mut self, text: impl Into<String>) {
        self.pending_item = text.into();
    }

    /// Whether the add control should be enabled.
    pub fn can_add_item(&self) -> bool {
        !self.pending_item.trim().is_empty()
    }

    /// Add the pending input as a custom item and check it.
    ///
    /// The pending input is cleared only on success.
    pub fn add_custom_item(&mut self) -> Result<String, AddItemError> {
        let item = self.pending_item.trim().to_string();

        if item.is_empty() {
            return Err(AddItemError::Empty);
        }
        if is_default_item(&item) {
            return Err(AddItemError::DefaultItem);
        }
        if self.selection.contains(&item) || self.custom_items.contains(&item) {
            return Err(AddItemError::Duplicate);
        }

        self.custom_items.push(item.clone());
        self.selection.insert(&item);
        self.pending_item.clear();
        Ok(item)
    }

    // -- submission ---------------------------------------------------------

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// Shared handle to the submitting flag, for disabling the submit control.
    pub fn submitting_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.submitting)
    }

    /// Current notice, if still visible at `now`.
    pub fn visible_notice(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible(now))
    }

    /// Current notice regardless of expiry.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Drop the notice once its deadline has passed.
    pub fn dismiss_expired(&mut self, now: DateTime<Utc>) {
        if self.notice.as_ref().is_some_and(|n| !n.is_visible(now)) {
            self.notice = None;
        }
    }

    /// Send the current selection.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(_guard) = SubmittingGuard::try_raise(&self.submitting) else {
            debug!("submit ignored, another submission is in flight");
            return SubmitOutcome::AlreadySubmitting;
        };
        let messages = self.locale.messages();
        self.notice = None;

        if self.selection.is_empty() {
            self.notice = Some(Notice::new(
                NoticeKind::Error,
                messages.select_or_add.to_string(),
                None,
            ));
            return SubmitOutcome::EmptySelection;
        }

        let request = SendItemsRequest {
            password: self.password.clone(),
            items: self.selection.iter().map(str::to_string).collect(),
        };

        match self.api.send_items(&request).await {
            Ok(()) => {
                info!(items = request.items.len(), "shopping list sent");
                if let Err(e) = self
                    .credentials
                    .set(PASSWORD_KEY, &self.password, password_ttl())
                {
                    warn!(error = %e, "failed to persist password");
                }
                self.notice = Some(Notice::new(
                    NoticeKind::Success,
                    messages.sent.to_string(),
                    Some(success_notice_ttl()),
                ));
                self.selection.clear();
                self.pending_item.clear();
                self.custom_items.clear();
                SubmitOutcome::Sent
            }
            Err(SubmitError::Rejected { status, message }) => {
                warn!(status, "shopping list rejected");
                let detail = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| messages.server_error.to_string());
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    format!("{}{}", messages.error_prefix, detail),
                    Some(error_notice_ttl()),
                ));
                SubmitOutcome::Rejected { status }
            }
            Err(SubmitError::Transport(reason)) => {
                warn!(reason = %reason, "shopping list could not be sent");
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    messages.send_failed.to_string(),
                    Some(error_notice_ttl()),
                ));
                SubmitOutcome::Failed
            }
        }
    }
}
