//! Streaming chat reducer.
//!
//! [`ChatState`] owns one conversation and applies the transitions of a
//! single submission: the user message, the first fragment (which creates
//! the assistant message), every later fragment (which replaces its text with
//! the accumulated text), and failure (which appends one error reply).
//!
//! The reducer does no I/O. [`ChatWidget`](super::ChatWidget) drives it from
//! a completion stream.

use serde::Serialize;
use thiserror::Error;

use crate::events::ChatEvent;
use crate::llm::{CompletionError, FailureClass};

use super::message::{Author, Message};

/// Error shown when no completion backend is configured.
pub const CONFIGURATION_MISSING: &str = "API Key missing. Please check configuration.";

/// Progress of the current submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No submission in flight; input is enabled.
    #[default]
    Idle,
    /// Request sent, no content yet; the typing indicator is shown.
    AwaitingFirstFragment,
    /// The last assistant message is being extended.
    Streaming,
}

/// Reasons a submission is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// A response is still streaming for this conversation.
    #[error("a response is already streaming")]
    Busy,
    /// No completion backend is configured.
    #[error("API Key missing. Please check configuration.")]
    NotConfigured,
}

/// Everything needed to issue the outbound request for a submission.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The appended user message.
    pub user_message: Message,
    /// Transcript as it was before `user_message` was appended.
    pub history: Vec<Message>,
}

/// Conversation plus widget indicators.
#[derive(Debug, Clone)]
pub struct ChatState {
    messages: Vec<Message>,
    phase: Phase,
    error: Option<String>,
    open: bool,
    accumulated: String,
}

impl ChatState {
    /// Create a conversation seeded with a greeting from the assistant.
    #[must_use]
    pub fn new(greeting: &str) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
            phase: Phase::Idle,
            error: None,
            open: false,
            accumulated: String::new(),
        }
    }

    /// Transcript in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the typing indicator should be shown.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.phase == Phase::AwaitingFirstFragment
    }

    /// Whether a submission is in flight (input disabled).
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Transient error text shown near the input box.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the chat window is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip the chat window's visibility and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Start a submission.
    ///
    /// Returns `Ok(None)` for blank input, which changes nothing. When
    /// `configured` is false the error indicator is set and nothing is
    /// appended.
    pub fn begin_turn(&mut self, input: &str, configured: bool) -> Result<Option<Turn>, ChatError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.is_streaming() {
            return Err(ChatError::Busy);
        }
        if !configured {
            self.error = Some(CONFIGURATION_MISSING.to_string());
            return Err(ChatError::NotConfigured);
        }

        let history = self.messages.clone();
        let user_message = Message::now(Author::User, text);
        self.messages.push(user_message.clone());
        self.error = None;
        self.accumulated.clear();
        self.phase = Phase::AwaitingFirstFragment;

        Ok(Some(Turn {
            user_message,
            history,
        }))
    }

    /// Apply one fragment of the response.
    ///
    /// Empty fragments and fragments arriving while idle are ignored.
    pub fn apply_fragment(&mut self, fragment: &str) -> Option<ChatEvent> {
        if fragment.is_empty() || self.phase == Phase::Idle {
            return None;
        }

        self.accumulated.push_str(fragment);

        if self.phase == Phase::AwaitingFirstFragment {
            self.phase = Phase::Streaming;
            let message = Message::now(Author::Assistant, self.accumulated.clone());
            self.messages.push(message.clone());
            return Some(ChatEvent::AssistantStarted { message });
        }

        let last = self.messages.last_mut()?;
        last.text.clone_from(&self.accumulated);
        Some(ChatEvent::AssistantUpdated {
            text: self.accumulated.clone(),
        })
    }

    /// Record a failure of the outbound call.
    ///
    /// Appends exactly one assistant message with the classified reply and
    /// sets the error indicator to the same text. Partial text already shown
    /// stays in place.
    pub fn fail(&mut self, err: &CompletionError) -> ChatEvent {
        let class = err.class();
        let reply = class.reply();
        self.error = Some(reply.to_string());

        let message = Message::now(Author::Assistant, reply);
        self.messages.push(message.clone());

        ChatEvent::Failed {
            message,
            rate_limited: class == FailureClass::RateLimited,
        }
    }

    /// Handle the end of the fragment stream.
    ///
    /// A stream that produced no content at all is reported as a failure.
    pub fn finish(&mut self) -> Option<ChatEvent> {
        (self.phase == Phase::AwaitingFirstFragment).then(|| self.fail(&CompletionError::EmptyResponse))
    }

    /// Return to idle. Safe to call more than once.
    pub fn settle(&mut self) {
        self.phase = Phase::Idle;
        self.accumulated.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GENERIC_FAILURE_REPLY, RATE_LIMITED_REPLY};

    const GREETING: &str = "Hello! How can I help you today?";

    fn started() -> ChatState {
        let mut state = ChatState::new(GREETING);
        state.begin_turn("Hello", true).unwrap().unwrap();
        state
    }

    #[test]
    fn test_seeded_with_greeting() {
        let state = ChatState::new(GREETING);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].author, Author::Assistant);
        assert_eq!(state.messages()[0].text, GREETING);
        assert!(!state.is_streaming());
        assert!(!state.is_open());
    }

    #[test]
    fn test_blank_input_is_noop() {
        let mut state = ChatState::new(GREETING);
        assert!(state.begin_turn("   \n\t", true).unwrap().is_none());
        assert!(state.begin_turn("", false).unwrap().is_none());
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.error().is_none());
    }

    #[test]
    fn test_begin_turn_appends_trimmed_user_message() {
        let mut state = ChatState::new(GREETING);
        let turn = state.begin_turn("  Hello  ", true).unwrap().unwrap();

        assert_eq!(turn.user_message.text, "Hello");
        assert_eq!(turn.history.len(), 1);
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].author, Author::User);
        assert!(state.is_typing());
    }

    #[test]
    fn test_unconfigured_sets_error_without_appending() {
        let mut state = ChatState::new(GREETING);
        let err = state.begin_turn("Hello", false).unwrap_err();
        assert_eq!(err, ChatError::NotConfigured);
        assert_eq!(state.error(), Some(CONFIGURATION_MISSING));
        assert_eq!(state.messages().len(), 1);
        assert!(!state.is_streaming());
    }

    #[test]
    fn test_busy_rejects_second_submission() {
        let mut state = started();
        assert_eq!(state.begin_turn("again", true).unwrap_err(), ChatError::Busy);
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_fragments_accumulate_into_one_message() {
        let mut state = started();

        let first = state.apply_fragment("Hi").unwrap();
        assert!(matches!(first, ChatEvent::AssistantStarted { ref message } if message.text == "Hi"));
        assert!(!state.is_typing());
        assert!(state.is_streaming());

        assert!(state.apply_fragment("").is_none());
        let second = state.apply_fragment(" there").unwrap();
        assert_eq!(
            second,
            ChatEvent::AssistantUpdated {
                text: "Hi there".to_string()
            }
        );
        state.apply_fragment("!");
        assert!(state.finish().is_none());
        state.settle();

        let tail: Vec<(Author, &str)> = state
            .messages()
            .iter()
            .skip(1)
            .map(|m| (m.author, m.text.as_str()))
            .collect();
        assert_eq!(
            tail,
            vec![(Author::User, "Hello"), (Author::Assistant, "Hi there!")]
        );
        assert!(!state.is_streaming());
    }

    #[test]
    fn test_many_fragments_single_message() {
        let mut state = started();
        let mut expected = String::new();
        for i in 0..1000 {
            let fragment = format!("{} ", i % 10);
            expected.push_str(&fragment);
            state.apply_fragment(&fragment);
        }
        state.settle();

        assert_eq!(state.messages().len(), 3);
        assert_eq!(state.messages()[2].text, expected);
    }

    #[test]
    fn test_rate_limited_failure() {
        let mut state = started();
        let err = CompletionError::Service("Error: 429 Too Many Requests".to_string());

        let event = state.fail(&err);
        state.settle();

        assert!(matches!(event, ChatEvent::Failed { rate_limited: true, .. }));
        assert_eq!(state.messages().len(), 3);
        assert_eq!(state.messages()[2].text, RATE_LIMITED_REPLY);
        assert_eq!(state.error(), Some(RATE_LIMITED_REPLY));
        assert!(!state.is_streaming());
    }

    #[test]
    fn test_mid_stream_failure_keeps_partial_text() {
        let mut state = started();
        state.apply_fragment("Partial");
        state.fail(&CompletionError::Service("connection reset".to_string()));
        state.settle();

        assert_eq!(state.messages().len(), 4);
        assert_eq!(state.messages()[2].text, "Partial");
        assert_eq!(state.messages()[3].text, GENERIC_FAILURE_REPLY);
        assert_eq!(state.error(), Some(GENERIC_FAILURE_REPLY));
    }

    #[test]
    fn test_zero_fragments_is_failure() {
        let mut state = started();
        let event = state.finish().unwrap();
        state.settle();

        assert!(matches!(event, ChatEvent::Failed { rate_limited: false, .. }));
        assert_eq!(state.messages().len(), 3);
        assert_eq!(state.messages()[2].text, GENERIC_FAILURE_REPLY);
        assert!(!state.is_streaming());
    }

    #[test]
    fn test_next_submission_clears_error() {
        let mut state = started();
        state.fail(&CompletionError::EmptyResponse);
        state.settle();
        assert!(state.error().is_some());

        state.begin_turn("retry", true).unwrap().unwrap();
        assert!(state.error().is_none());
    }

    #[test]
    fn test_fragment_after_settle_is_ignored() {
        let mut state = started();
        state.settle();
        assert!(state.apply_fragment("late").is_none());
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_toggle() {
        let mut state = ChatState::new(GREETING);
        assert!(state.toggle());
        assert!(!state.toggle());
    }
}
