//! Shopping list form - client side of the shared-password shopping list
//!
//! This crate provides a headless form controller that tracks the selected
//! items, adds custom entries, remembers the password after a successful
//! submission and posts the list to the gateway.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shopping_form::{FormController, HttpSubmitApi, Locale, MemoryCredentialStore};
//!
//! let api = HttpSubmitApi::new("http://localhost:8080").unwrap();
//! let mut form = FormController::new(
//!     Arc::new(api),
//!     Arc::new(MemoryCredentialStore::new()),
//!     Locale::Ja,
//! );
//!
//! assert!(!form.load());
//! form.toggle("牛乳");
//! form.set_pending_item("チーズ");
//! form.add_custom_item().unwrap();
//!
//! let selected: Vec<&str> = form.selection().iter().collect();
//! assert_eq!(selected, vec!["牛乳", "チーズ"]);
//! ```

pub mod api;
pub mod catalog;
pub mod controller;
pub mod credential;
pub mod messages;

// Re-export commonly used types at the crate root
pub use api::{HttpSubmitApi, SendItemsRequest, SubmitApi, SubmitError};
pub use catalog::DEFAULT_ITEMS;
pub use controller::{AddItemError, FormController, Notice, NoticeKind, SubmitOutcome};
pub use credential::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use messages::Locale;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
