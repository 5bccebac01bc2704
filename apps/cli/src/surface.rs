//! Terminal rendition of the chat surface.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use nuru_core::{Surface, message_html};
use nuru_shared::ChatMessage;

/// Prints assistant messages to stdout and shows a spinner while a reply is
/// pending.
///
/// In text mode user messages are not echoed, since the terminal already
/// shows what was typed.
pub(crate) struct CliSurface {
    html: bool,
    typing: Mutex<Option<ProgressBar>>,
}

impl CliSurface {
    pub(crate) fn new(html: bool) -> Self {
        Self {
            html,
            typing: Mutex::new(None),
        }
    }
}

fn typing_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .map(|style| style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("Nuru is typing...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

impl Surface for CliSurface {
    fn append(&self, message: &ChatMessage) {
        if self.html {
            println!("{}", message_html(message));
        } else if !message.is_user {
            println!("\nNuru: {}\n", message.content);
        }
    }

    fn clear_input(&self) {}

    fn show_typing(&self, _id: &str) {
        let mut typing = self.typing.lock().unwrap_or_else(PoisonError::into_inner);
        if typing.is_none() {
            *typing = Some(typing_spinner());
        }
    }

    fn hide_typing(&self, _id: &str) {
        let mut typing = self.typing.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(spinner) = typing.take() {
            spinner.finish_and_clear();
        }
    }
}
