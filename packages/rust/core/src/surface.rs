//! Presentation surface: where the widget shows its transcript.
//!
//! The controller only talks to the [`Surface`] trait. [`TranscriptSurface`]
//! is the in-memory implementation used by the TUI and by tests; it also
//! produces the HTML markup a web page would show.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nuru_markdown::{escape_html, render_markdown, render_plain};
use nuru_shared::ChatMessage;

/// Element id of the typing indicator.
pub const TYPING_INDICATOR_ID: &str = "typing-indicator";

/// Display operations the widget controller needs.
///
/// Implementations must be cheap and must not fail; they run in the middle
/// of a send.
pub trait Surface: Send + Sync {
    /// Add a message to the end of the log and keep it in view.
    fn append(&self, message: &ChatMessage);

    /// Empty the user's input field.
    fn clear_input(&self);

    /// Add a typing indicator element with the given id.
    fn show_typing(&self, id: &str);

    /// Remove the typing indicator with the given id, if present.
    fn hide_typing(&self, id: &str);
}

impl<S: Surface + ?Sized> Surface for Arc<S> {
    fn append(&self, message: &ChatMessage) {
        (**self).append(message);
    }

    fn clear_input(&self) {
        (**self).clear_input();
    }

    fn show_typing(&self, id: &str) {
        (**self).show_typing(id);
    }

    fn hide_typing(&self, id: &str) {
        (**self).hide_typing(id);
    }
}

// ---------------------------------------------------------------------------
// Markup
// ---------------------------------------------------------------------------

/// Markup for one message element.
///
/// User text is escaped verbatim; assistant text goes through the Markdown
/// renderer.
pub fn message_html(message: &ChatMessage) -> String {
    let (class, body) = if message.is_user {
        ("user-message", render_plain(&message.content))
    } else {
        ("bot-message", render_markdown(&message.content))
    };
    format!(r#"<div class="message {class}">{body}</div>"#)
}

/// Markup for the three-dot typing indicator.
pub fn typing_indicator_html(id: &str) -> String {
    format!(
        r#"<div class="message bot-message typing" id="{}"><span></span><span></span><span></span></div>"#,
        escape_html(id)
    )
}

// ---------------------------------------------------------------------------
// TranscriptSurface
// ---------------------------------------------------------------------------

/// One element of the message log.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEntry {
    Message(ChatMessage),
    Typing { id: String },
}

#[derive(Debug, Default)]
struct TranscriptState {
    entries: Vec<SurfaceEntry>,
    input: String,
}

/// In-memory surface holding the log entries and the draft input.
#[derive(Debug, Default)]
pub struct TranscriptSurface {
    state: Mutex<TranscriptState>,
}

impl TranscriptSurface {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the state consistent (every
    // mutation is a single push, retain or assignment), so poisoning is
    // ignored.
    fn state(&self) -> MutexGuard<'_, TranscriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> Vec<SurfaceEntry> {
        self.state().entries.clone()
    }

    /// Messages only, in display order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.state()
            .entries
            .iter()
            .filter_map(|entry| match entry {
                SurfaceEntry::Message(message) => Some(message.clone()),
                SurfaceEntry::Typing { .. } => None,
            })
            .collect()
    }

    pub fn is_typing(&self) -> bool {
        self.state()
            .entries
            .iter()
            .any(|entry| matches!(entry, SurfaceEntry::Typing { .. }))
    }

    pub fn input(&self) -> String {
        self.state().input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.state().input = text.into();
    }

    pub fn push_input(&self, ch: char) {
        self.state().input.push(ch);
    }

    pub fn pop_input(&self) {
        self.state().input.pop();
    }

    /// Markup of the whole message log.
    pub fn to_html(&self) -> String {
        self.state()
            .entries
            .iter()
            .map(|entry| match entry {
                SurfaceEntry::Message(message) => message_html(message),
                SurfaceEntry::Typing { id } => typing_indicator_html(id),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Surface for TranscriptSurface {
    fn append(&self, message: &ChatMessage) {
        self.state().entries.push(SurfaceEntry::Message(message.clone()));
    }

    fn clear_input(&self) {
        self.state().input.clear();
    }

    fn show_typing(&self, id: &str) {
        self.state()
            .entries
            .push(SurfaceEntry::Typing { id: id.to_string() });
    }

    fn hide_typing(&self, id: &str) {
        self.state()
            .entries
            .retain(|entry| !matches!(entry, SurfaceEntry::Typing { id: existing } if existing == id));
    }
}
