//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Bottom status bar. Turns yellow while a reply is pending.
pub(crate) fn status_bar(msg: &str, pending: bool) -> Paragraph<'_> {
    let fg = if pending { Color::Yellow } else { Color::White };
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(fg))
}
