//! Chat render events and their SSE encoding.
//!
//! A submission produces a sequence of [`ChatEvent`]s that mirror the
//! transcript mutations, so the browser can apply them one by one:
//!
//! - `message.user`: the visitor's message was appended
//! - `typing`: request sent, waiting for the first fragment
//! - `message.created`: first fragment arrived; a new assistant message
//! - `message.updated`: full text of the last assistant message so far
//! - `error`: the call failed; one assistant reply with the classified text
//! - `done`: the submission settled; input may be re-enabled
//!
//! # Example
//!
//! ```rust
//! use portfolio_site::events::{ChatEvent, sse_event};
//!
//! let sse = sse_event(&ChatEvent::Done);
//! assert!(sse.starts_with("event: done\n"));
//! ```

use serde::Serialize;

use crate::chat::Message;
use crate::chat::render::render_markdown;

/// Transcript mutation emitted while a submission runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The visitor's message was appended.
    UserMessage {
        /// The appended message.
        message: Message,
    },
    /// Waiting for the first fragment.
    Typing,
    /// First fragment arrived and an assistant message was appended.
    AssistantStarted {
        /// The new message.
        message: Message,
    },
    /// The last assistant message's text was replaced.
    AssistantUpdated {
        /// Concatenation of every fragment so far.
        text: String,
    },
    /// The call failed and an error reply was appended.
    Failed {
        /// The appended reply; its text is also the error indicator.
        message: Message,
        /// Whether the failure was classified as rate limiting.
        rate_limited: bool,
    },
    /// The submission settled.
    Done,
}

/// JSON body of a message-carrying event.
#[derive(Serialize)]
struct MessagePayload<'a> {
    #[serde(flatten)]
    message: &'a Message,
    html: String,
}

impl<'a> From<&'a Message> for MessagePayload<'a> {
    fn from(message: &'a Message) -> Self {
        Self {
            message,
            html: render_markdown(&message.text),
        }
    }
}

/// Get the SSE event name for a [`ChatEvent`].
pub fn event_name(evt: &ChatEvent) -> &'static str {
    match evt {
        ChatEvent::UserMessage { .. } => "message.user",
        ChatEvent::Typing => "typing",
        ChatEvent::AssistantStarted { .. } => "message.created",
        ChatEvent::AssistantUpdated { .. } => "message.updated",
        ChatEvent::Failed { .. } => "error",
        ChatEvent::Done => "done",
    }
}

/// JSON payload for a [`ChatEvent`].
pub fn event_payload(evt: &ChatEvent) -> serde_json::Value {
    let payload = match evt {
        ChatEvent::UserMessage { message } | ChatEvent::AssistantStarted { message } => {
            serde_json::to_value(MessagePayload::from(message))
        }
        ChatEvent::AssistantUpdated { text } => Ok(serde_json::json!({
            "text": text,
            "html": render_markdown(text),
        })),
        ChatEvent::Failed {
            message,
            rate_limited,
        } => Ok(serde_json::json!({
            "error": message.text,
            "rate_limited": rate_limited,
            "message": MessagePayload::from(message),
        })),
        ChatEvent::Typing | ChatEvent::Done => Ok(serde_json::json!({})),
    };

    payload.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
}

/// Convert a [`ChatEvent`] to an SSE-formatted string.
///
/// The output carries an `event:` line (for `EventSource` listeners) and a
/// `data:` line containing the JSON payload.
pub fn sse_event(evt: &ChatEvent) -> String {
    let json = event_payload(evt).to_string();
    format!("event: {}\ndata: {json}\n\n", event_name(evt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_event_format() {
        let sse = sse_event(&ChatEvent::Done);
        assert!(sse.starts_with("event: done\n"));
        assert!(sse.contains("data: {}"));
        assert!(sse.ends_with("\n\n"));
    }

    #[test]
    fn test_updated_carries_full_text_and_html() {
        let sse = sse_event(&ChatEvent::AssistantUpdated {
            text: "**Hi** there".to_string(),
        });
        assert!(sse.starts_with("event: message.updated\n"));
        assert!(sse.contains("\"text\":\"**Hi** there\""));
        assert!(sse.contains("<strong>Hi</strong>"));
    }

    #[test]
    fn test_message_payload_is_flat() {
        let message = Message::assistant("Hello");
        let payload = event_payload(&ChatEvent::AssistantStarted { message });
        assert_eq!(payload["author"], "assistant");
        assert_eq!(payload["text"], "Hello");
        assert!(payload["timestamp"].is_string());
        assert_eq!(payload["html"], "<p>Hello</p>\n");
    }

    #[test]
    fn test_failed_payload() {
        let message = Message::assistant("busy");
        let payload = event_payload(&ChatEvent::Failed {
            message,
            rate_limited: true,
        });
        assert_eq!(payload["error"], "busy");
        assert_eq!(payload["rate_limited"], true);
        assert_eq!(payload["message"]["text"], "busy");
    }
}
