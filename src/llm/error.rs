//! Errors raised by completion backends.

use thiserror::Error;

/// Reply shown when the completion service is throttling us.
pub const RATE_LIMITED_REPLY: &str = "I am currently experiencing high traffic. Please wait a moment.";

/// Reply shown for every other completion failure.
pub const GENERIC_FAILURE_REPLY: &str =
    "Sorry, I encountered an error connecting to the AI. Please try again.";

/// Failure of a streaming completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// The request could not be sent or the body stream broke.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A stream frame could not be decoded.
    #[error("invalid stream payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service reported an error inside the stream.
    #[error("completion service error: {0}")]
    Service(String),

    /// The stream ended without producing any text.
    #[error("completion stream ended without content")]
    EmptyResponse,
}

/// How a failure is presented to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// HTTP 429 or an equivalent "too many requests" signal.
    RateLimited,
    /// Anything else.
    Generic,
}

impl FailureClass {
    /// User-facing text for this class.
    #[must_use]
    pub fn reply(self) -> &'static str {
        match self {
            Self::RateLimited => RATE_LIMITED_REPLY,
            Self::Generic => GENERIC_FAILURE_REPLY,
        }
    }
}

impl CompletionError {
    /// Classify this error for display.
    #[must_use]
    pub fn class(&self) -> FailureClass {
        let rate_limited = match self {
            Self::Http { status, .. } => *status == 429,
            Self::Transport(e) => e.status().is_some_and(|s| s.as_u16() == 429),
            Self::Parse(_) | Self::EmptyResponse => false,
            Self::Service(_) => false,
        };

        if rate_limited || mentions_rate_limit(&self.to_string()) {
            FailureClass::RateLimited
        } else {
            FailureClass::Generic
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    message.contains("429") || message.to_ascii_lowercase().contains("too many requests")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_429_is_rate_limited() {
        let err = CompletionError::Http {
            status: 429,
            body: String::new(),
        };
        assert_eq!(err.class(), FailureClass::RateLimited);
        assert_eq!(err.class().reply(), RATE_LIMITED_REPLY);
    }

    #[test]
    fn test_service_message_mentioning_429() {
        let err = CompletionError::Service("upstream said 429, slow down".to_string());
        assert_eq!(err.class(), FailureClass::RateLimited);

        let err = CompletionError::Service("Too Many Requests".to_string());
        assert_eq!(err.class(), FailureClass::RateLimited);
    }

    #[test]
    fn test_other_failures_are_generic() {
        let err = CompletionError::Http {
            status: 500,
            body: "internal".to_string(),
        };
        assert_eq!(err.class(), FailureClass::Generic);
        assert_eq!(
            CompletionError::EmptyResponse.class().reply(),
            GENERIC_FAILURE_REPLY
        );
    }
}
