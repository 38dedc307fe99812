//! Mapping from the transcript to the completion service's wire format.

use crate::llm::{WireMessage, WireRole};

use super::message::{Author, Message};

/// Wire role for a transcript author.
#[must_use]
pub fn wire_role(author: Author) -> WireRole {
    match author {
        Author::User => WireRole::User,
        Author::Assistant => WireRole::Assistant,
    }
}

/// Build the outbound message list for one submission.
///
/// The result is the system instruction, then every prior transcript entry
/// in order, then the new user text. `history` must not already contain the
/// new user message.
#[must_use]
pub fn to_wire(system: &str, history: &[Message], user_text: &str) -> Vec<WireMessage> {
    let mut out = Vec::with_capacity(history.len() + 2);
    out.push(WireMessage::new(WireRole::System, system));
    out.extend(
        history
            .iter()
            .map(|m| WireMessage::new(wire_role(m.author), m.text.clone())),
    );
    out.push(WireMessage::new(WireRole::User, user_text));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let wire = to_wire("be brief", &[], "Hello");
        assert_eq!(
            wire,
            vec![
                WireMessage::new(WireRole::System, "be brief"),
                WireMessage::new(WireRole::User, "Hello"),
            ]
        );
    }

    #[test]
    fn test_history_keeps_order_and_roles() {
        let history = vec![
            Message::assistant("Hello! How can I help?"),
            Message::user("What projects?"),
            Message::assistant("DataGenKit and more."),
        ];
        let wire = to_wire("sys", &history, "Tell me more");

        let roles: Vec<WireRole> = wire.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                WireRole::System,
                WireRole::Assistant,
                WireRole::User,
                WireRole::Assistant,
                WireRole::User,
            ]
        );
        assert_eq!(wire[3].content, "DataGenKit and more.");
        assert_eq!(wire[4].content, "Tell me more");
    }

    #[test]
    fn test_wire_json_shape() {
        let wire = to_wire("sys", &[], "hi");
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[1]["role"], "user");
        assert_eq!(json[1]["content"], "hi");
    }
}
