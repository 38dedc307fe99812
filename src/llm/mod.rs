//! Completion service client.
//!
//! The chat widget talks to the model through the [`CompletionService`]
//! trait. The production implementation is [`ChatCompletionsDriver`], which
//! speaks the `OpenAI` Chat Completions protocol (`/v1/chat/completions`)
//! that Groq, `OpenAI` and `OpenRouter` all accept.
//!
//! # Example
//!
//! ```rust,ignore
//! use portfolio_site::llm::{ChatCompletionsDriver, LlmSettings, Provider};
//!
//! let settings = LlmSettings {
//!     base_url: "https://api.groq.com/openai".to_string(),
//!     api_key: "gsk-...".to_string(),
//!     model: "llama-3.3-70b-versatile".to_string(),
//!     provider: Provider::Groq,
//! };
//! let driver = ChatCompletionsDriver::new(settings);
//! ```

pub mod chat_completions;
pub mod error;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use error::{CompletionError, FailureClass, GENERIC_FAILURE_REPLY, RATE_LIMITED_REPLY};
pub use provider::Provider;

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

/// Default model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Default base URL (Groq's OpenAI-compatible endpoint).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";

/// Connection and model settings for a configured backend.
#[derive(Clone)]
pub struct LlmSettings {
    /// Base URL for the API (e.g., `https://api.groq.com/openai`).
    pub base_url: String,
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Provider (detected from `base_url`).
    pub provider: Provider,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Role vocabulary of the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    /// System instruction.
    System,
    /// Visitor text.
    User,
    /// Model text.
    Assistant,
}

/// One message in the completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Author role.
    pub role: WireRole,
    /// Plain text content.
    pub content: String,
}

impl WireMessage {
    /// Create a message with the given role.
    #[must_use]
    pub fn new(role: WireRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request to a completion service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Ordered conversation, system instruction first.
    pub messages: Vec<WireMessage>,
}

/// Lazy sequence of text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// A streaming completion backend.
///
/// Errors returned from [`stream`](Self::stream) mean the request failed
/// before any content arrived; errors yielded by the stream mean it broke
/// part way through.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Start a streaming completion.
    async fn stream(&self, req: CompletionRequest) -> Result<FragmentStream, CompletionError>;
}
