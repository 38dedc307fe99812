//! The chatbot widget.
//!
//! # Architecture
//!
//! - [`message`]: transcript entries
//! - [`reducer`]: the state machine a submission runs through
//! - [`mapping`]: transcript to completion wire format
//! - [`widget`]: ties a conversation to a completion backend and streams
//!   render events
//! - [`render`]: markdown rendering of transcript entries
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use portfolio_site::chat::{ChatBackend, ChatWidget, Submission};
//!
//! let widget = ChatWidget::new(backend, system_prompt, "Hello!");
//! if let Submission::Started(mut events) = widget.submit("What do you build?")? {
//!     while let Some(event) = events.next().await {
//!         // forward to the browser
//!     }
//! }
//! ```

pub mod mapping;
pub mod message;
pub mod reducer;
pub mod render;
pub mod widget;

pub use message::{Author, Message};
pub use reducer::{CONFIGURATION_MISSING, ChatError, ChatState, Phase};
pub use widget::{ChatBackend, ChatWidget, EventStream, RenderedMessage, Submission, WidgetSnapshot};
