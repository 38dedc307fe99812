//! Personal portfolio site with a streaming AI chat assistant.
//!
//! The site is a single server-rendered page describing its owner, a contact
//! form relayed by email, and a chat widget that answers questions about the
//! owner by streaming replies from an OpenAI-compatible completion service.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server; chat replies stream as SSE
//! - **Chat**: per-tab widget state machine that folds completion fragments
//!   into a transcript and turns failures into one visible message
//! - **LLM**: streaming Chat Completions client for Groq and compatible APIs
//! - **Content**: profile data loaded from YAML and rendered to HTML
//!
//! # Modules
//!
//! - [`chat`]: widget state, transcript and markdown rendering
//! - [`llm`]: completion service trait and driver
//! - [`events`]: render events and their SSE encoding
//! - [`session`]: per-tab widget storage and idle eviction
//! - [`content`]: profile data
//! - [`pages`]: page rendering
//! - [`contact`]: contact form relay

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod contact;
pub mod content;
pub mod events;
pub mod llm;
pub mod pages;
pub mod rate_limit;
pub mod server;
pub mod session;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::contact::ContactRelay;
use crate::content::Profile;
use crate::rate_limit::SimpleRateLimiter;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// One chat widget per browser tab.
    pub sessions: SessionStore,
    /// Portfolio content.
    pub profile: Arc<Profile>,
    /// Contact relay; `None` when no recipient is configured.
    pub contact: Option<Arc<ContactRelay>>,
    /// Global Rate Limiter
    pub rate_limiter: Arc<SimpleRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}
