//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI and encapsulates its
//! own state and rendering logic.

mod chat;
mod context;

use std::fmt;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;

pub(crate) use chat::ChatScreen;
pub(crate) use context::ContextScreen;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Chat,
    Context,
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "Chat"),
            Self::Context => write!(f, "Context"),
        }
    }
}

/// What a key press asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Send(String),
}

/// State of every screen.
pub(crate) struct Screens {
    pub chat: ChatScreen,
    pub context: ContextScreen,
}

impl Screens {
    /// Whether the given screen has an active text input field.
    pub(crate) fn is_editing(&self, id: ScreenId) -> bool {
        match id {
            ScreenId::Chat => self.chat.is_editing(),
            ScreenId::Context => false,
        }
    }

    pub(crate) fn draw(&self, id: ScreenId, f: &mut Frame, area: Rect) {
        match id {
            ScreenId::Chat => self.chat.draw(f, area),
            ScreenId::Context => self.context.draw(f, area),
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        id: ScreenId,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> Action {
        match id {
            ScreenId::Chat => self.chat.handle_key(code, modifiers),
            ScreenId::Context => self.context.handle_key(code, modifiers),
        }
    }
}
