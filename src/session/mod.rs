//! Chat session management.
//!
//! Each browser tab gets its own session holding one
//! [`ChatWidget`](crate::chat::ChatWidget). Sessions live in memory only and
//! are evicted after sitting idle.
//!
//! # Architecture
//!
//! - [`Session`]: one tab's conversation
//! - [`SessionStore`]: thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use portfolio_site::chat::ChatBackend;
//! use portfolio_site::session::{SessionStore, WidgetTemplate};
//!
//! let store = SessionStore::new(WidgetTemplate {
//!     backend: ChatBackend::Unconfigured,
//!     system_prompt: Arc::from("You describe the site owner."),
//!     greeting: Arc::from("Hello!"),
//! });
//! let session = store.create();
//!
//! let messages = session.widget().messages();
//! assert_eq!(messages.len(), 1);
//! ```

mod thread;

pub use thread::{Session, SessionStore, WidgetTemplate};
