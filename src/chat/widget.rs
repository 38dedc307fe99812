//! Chat widget: one conversation bound to a completion backend.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::events::ChatEvent;
use crate::llm::{CompletionRequest, CompletionService};

use super::mapping::to_wire;
use super::message::Message;
use super::reducer::{ChatError, ChatState};
use super::render::render_markdown;

/// Stream of render events for one submission.
pub type EventStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// Completion backend handed to every widget.
///
/// Built once at startup from configuration. `Unconfigured` stands in when no
/// credential is available so submissions fail with a configuration error
/// instead of reaching the network.
#[derive(Clone)]
pub enum ChatBackend {
    /// A ready completion service.
    Configured(Arc<dyn CompletionService>),
    /// No credential; every submission is refused.
    Unconfigured,
}

impl ChatBackend {
    /// Whether submissions can reach a completion service.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

impl std::fmt::Debug for ChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configured(_) => f.write_str("ChatBackend::Configured"),
            Self::Unconfigured => f.write_str("ChatBackend::Unconfigured"),
        }
    }
}

/// Outcome of [`ChatWidget::submit`].
pub enum Submission {
    /// Blank input; nothing changed.
    Ignored,
    /// A request was issued. Poll the stream to drive it.
    Started(EventStream),
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ignored => f.write_str("Submission::Ignored"),
            Self::Started(_) => f.write_str("Submission::Started"),
        }
    }
}

/// A transcript entry as the rendering layer sees it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedMessage {
    /// The entry itself.
    #[serde(flatten)]
    pub message: Message,
    /// Markdown rendered to HTML.
    pub html: String,
}

impl From<&Message> for RenderedMessage {
    fn from(message: &Message) -> Self {
        Self {
            html: render_markdown(&message.text),
            message: message.clone(),
        }
    }
}

/// Everything the rendering layer needs to draw the widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    /// Chat window visibility.
    pub open: bool,
    /// Typing indicator (request sent, no content yet).
    pub typing: bool,
    /// Input disabled while a response is in flight.
    pub streaming: bool,
    /// Transient error text.
    pub error: Option<String>,
    /// Transcript.
    pub messages: Vec<RenderedMessage>,
}

/// One conversation plus the backend it talks to.
#[derive(Clone)]
pub struct ChatWidget {
    state: Arc<Mutex<ChatState>>,
    backend: ChatBackend,
    system_prompt: Arc<str>,
}

impl std::fmt::Debug for ChatWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatWidget")
            .field("backend", &self.backend)
            .field("state", &*lock(&self.state))
            .finish()
    }
}

impl ChatWidget {
    /// Create a widget whose conversation starts with `greeting`.
    #[must_use]
    pub fn new(backend: ChatBackend, system_prompt: Arc<str>, greeting: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::new(greeting))),
            backend,
            system_prompt,
        }
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        let state = lock(&self.state);
        WidgetSnapshot {
            open: state.is_open(),
            typing: state.is_typing(),
            streaming: state.is_streaming(),
            error: state.error().map(ToString::to_string),
            messages: state.messages().iter().map(RenderedMessage::from).collect(),
        }
    }

    /// Transcript copy.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.state).messages().to_vec()
    }

    /// Whether a response is in flight.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        lock(&self.state).is_streaming()
    }

    /// Flip the chat window's visibility.
    pub fn toggle(&self) -> bool {
        lock(&self.state).toggle()
    }

    /// Submit visitor text.
    ///
    /// The returned stream issues the outbound request when first polled and
    /// yields render events until the call settles, ending with
    /// [`ChatEvent::Done`]. Dropping it early cancels the request; either way
    /// the widget returns to idle.
    pub fn submit(&self, input: &str) -> Result<Submission, ChatError> {
        let (turn, service) = {
            let mut state = lock(&self.state);
            let turn = match state.begin_turn(input, self.backend.is_configured()) {
                Ok(Some(turn)) => turn,
                Ok(None) => return Ok(Submission::Ignored),
                Err(e) => {
                    tracing::warn!(name: "chat.turn.rejected", error = %e, "Submission rejected");
                    return Err(e);
                }
            };
            let ChatBackend::Configured(service) = &self.backend else {
                state.settle();
                return Err(ChatError::NotConfigured);
            };
            (turn, Arc::clone(service))
        };

        let request = CompletionRequest {
            messages: to_wire(&self.system_prompt, &turn.history, &turn.user_message.text),
        };

        tracing::info!(
            name: "chat.turn.started",
            history_len = turn.history.len(),
            text_length = turn.user_message.text.len(),
            "Chat turn started"
        );

        // Owned by the stream so that dropping it, polled or not, settles.
        let guard = SettleGuard {
            state: Arc::clone(&self.state),
        };
        let user_message = turn.user_message;

        let events = async_stream::stream! {
            let guard = guard;
            yield ChatEvent::UserMessage { message: user_message };
            yield ChatEvent::Typing;

            match service.stream(request).await {
                Ok(mut fragments) => {
                    let mut count = 0usize;
                    loop {
                        match fragments.next().await {
                            Some(Ok(fragment)) => {
                                count += 1;
                                if let Some(event) = guard.with(|s| s.apply_fragment(&fragment)) {
                                    yield event;
                                }
                            }
                            Some(Err(e)) => {
                                tracing::error!(
                                    name: "chat.turn.failed",
                                    error = %e,
                                    fragments = count,
                                    "Completion stream failed"
                                );
                                yield guard.with(|s| s.fail(&e));
                                break;
                            }
                            None => {
                                match guard.with(ChatState::finish) {
                                    Some(event) => {
                                        tracing::warn!(name: "chat.turn.empty", "Completion stream ended without content");
                                        yield event;
                                    }
                                    None => {
                                        tracing::info!(name: "chat.turn.completed", fragments = count, "Chat turn completed");
                                    }
                                }
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(name: "chat.turn.failed", error = %e, "Completion request failed");
                    yield guard.with(|s| s.fail(&e));
                }
            }

            drop(guard);
            yield ChatEvent::Done;
        };

        Ok(Submission::Started(Box::pin(events)))
    }
}

/// Returns the widget to idle when dropped.
struct SettleGuard {
    state: Arc<Mutex<ChatState>>,
}

impl SettleGuard {
    fn with<T>(&self, f: impl FnOnce(&mut ChatState) -> T) -> T {
        f(&mut lock(&self.state))
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        lock(&self.state).settle();
    }
}

fn lock(state: &Mutex<ChatState>) -> MutexGuard<'_, ChatState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
