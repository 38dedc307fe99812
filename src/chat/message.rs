//! Transcript entries.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// The visitor.
    User,
    /// The assistant persona (including error replies).
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote it.
    pub author: Author,
    /// Text content. Grows in place while the assistant is streaming.
    pub text: String,
    /// Display timestamp, e.g. `3:04:05 PM`.
    pub timestamp: String,
}

impl Message {
    /// Create a message stamped with the current local time.
    #[must_use]
    pub fn now(author: Author, text: impl Into<String>) -> Self {
        Self::at(author, text, Local::now())
    }

    /// Create a message stamped with the given time.
    #[must_use]
    pub fn at(author: Author, text: impl Into<String>, time: DateTime<Local>) -> Self {
        Self {
            author,
            text: text.into(),
            timestamp: display_time(time),
        }
    }

    /// Shorthand for a user message stamped now.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::now(Author::User, text)
    }

    /// Shorthand for an assistant message stamped now.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::now(Author::Assistant, text)
    }
}

fn display_time(time: DateTime<Local>) -> String {
    time.format("%-I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_display_timestamp() {
        let time = Local.with_ymd_and_hms(2025, 3, 1, 15, 4, 5).unwrap();
        let msg = Message::at(Author::User, "hi", time);
        assert_eq!(msg.timestamp, "3:04:05 PM");
    }

    #[test]
    fn test_author_serialization() {
        let json = serde_json::to_string(&Author::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
