//! "Chat" screen: message log, typing indicator and the input line.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyModifiers};
use nuru_core::{SurfaceEntry, TranscriptSurface};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::Action;

const TYPING_FRAMES: [&str; 4] = ["   ", ".  ", ".. ", "..."];

pub(crate) struct ChatScreen {
    surface: Arc<TranscriptSurface>,
    editing: bool,
    /// Lines scrolled back from the bottom of the log.
    scroll_back: usize,
    tick: usize,
}

impl ChatScreen {
    pub(crate) fn new(surface: Arc<TranscriptSurface>) -> Self {
        Self {
            surface,
            editing: true,
            scroll_back: 0,
            tick: 0,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    /// Advance the typing animation.
    pub(crate) fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Log
                Constraint::Length(3), // Input
                Constraint::Length(1), // Hint
            ])
            .split(area);

        let log_block = Block::default().borders(Borders::ALL).title(" Nuru ");
        let inner = log_block.inner(chunks[0]);
        let width = usize::from(inner.width.max(1));
        let height = usize::from(inner.height);

        let lines = transcript_lines(&self.surface.entries(), width, self.tick / 3);
        let bottom = lines.len().saturating_sub(height);
        let offset = bottom.saturating_sub(self.scroll_back);
        let visible: Vec<Line> = lines.into_iter().skip(offset).take(height).collect();

        f.render_widget(Paragraph::new(visible).block(log_block), chunks[0]);

        let input_style = if self.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let input = Paragraph::new(self.surface.input()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Message ")
                .border_style(input_style),
        );
        f.render_widget(input, chunks[1]);

        let hint = if self.editing {
            "Enter to send · Esc to stop typing"
        } else {
            "i / Enter to type · ↑/↓ to scroll"
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[2],
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Action {
        if self.editing {
            match code {
                KeyCode::Esc => self.editing = false,
                KeyCode::Enter => {
                    self.scroll_back = 0;
                    return Action::Send(self.surface.input());
                }
                KeyCode::Backspace => self.surface.pop_input(),
                KeyCode::Char(c) => self.surface.push_input(c),
                _ => {}
            }
        } else {
            match code {
                KeyCode::Enter | KeyCode::Char('i') => self.editing = true,
                KeyCode::Up => self.scroll_back = self.scroll_back.saturating_add(1),
                KeyCode::Down => self.scroll_back = self.scroll_back.saturating_sub(1),
                KeyCode::End => self.scroll_back = 0,
                _ => {}
            }
        }
        Action::None
    }
}

// ---------------------------------------------------------------------------
// Transcript layout
// ---------------------------------------------------------------------------

fn transcript_lines(entries: &[SurfaceEntry], width: usize, frame: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for entry in entries {
        match entry {
            SurfaceEntry::Message(message) => {
                let (label, color) = if message.is_user {
                    ("You", Color::Green)
                } else {
                    ("Nuru", Color::Cyan)
                };
                lines.push(Line::from(Span::styled(
                    label,
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));
                for source_line in message.content.lines() {
                    let style = if !message.is_user && is_heading(source_line) {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    for wrapped in wrap_text(strip_markers(source_line, message.is_user), width) {
                        lines.push(Line::from(Span::styled(wrapped, style)));
                    }
                }
                lines.push(Line::from(""));
            }
            SurfaceEntry::Typing { .. } => {
                lines.push(Line::from(Span::styled(
                    format!("Nuru is typing{}", TYPING_FRAMES[frame % TYPING_FRAMES.len()]),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    lines
}

fn is_heading(line: &str) -> bool {
    line.starts_with("## ") || line.starts_with("### ")
}

/// Drop heading markers from assistant lines; user text is shown as typed.
fn strip_markers(line: &str, is_user: bool) -> &str {
    if is_user {
        return line;
    }
    line.strip_prefix("### ")
        .or_else(|| line.strip_prefix("## "))
        .unwrap_or(line)
}

/// Greedy word wrap. Words longer than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            out.push(word[..split].to_string());
            word = &word[split..];
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use nuru_shared::ChatMessage;

    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick", "brown fox"]
        );
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn transcript_labels_and_typing_line() {
        let entries = vec![
            SurfaceEntry::Message(ChatMessage::user("hi")),
            SurfaceEntry::Message(ChatMessage::assistant("## Plan\nStep one")),
            SurfaceEntry::Typing {
                id: "typing-indicator".into(),
            },
        ];

        let text: Vec<String> = transcript_lines(&entries, 40, 3)
            .iter()
            .map(|line| line.to_string())
            .collect();

        assert_eq!(text[0], "You");
        assert_eq!(text[1], "hi");
        assert_eq!(text[3], "Nuru");
        assert_eq!(text[4], "Plan");
        assert_eq!(text[5], "Step one");
        assert_eq!(text.last().map(String::as_str), Some("Nuru is typing..."));
    }

    #[test]
    fn enter_sends_current_input() {
        let surface = Arc::new(TranscriptSurface::new());
        let mut screen = ChatScreen::new(Arc::clone(&surface));

        screen.handle_key(KeyCode::Char('h'), KeyModifiers::NONE);
        screen.handle_key(KeyCode::Char('i'), KeyModifiers::NONE);
        let action = screen.handle_key(KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(action, Action::Send("hi".into()));
    }

    #[test]
    fn escape_leaves_editing() {
        let mut screen = ChatScreen::new(Arc::new(TranscriptSurface::new()));
        assert!(screen.is_editing());
        screen.handle_key(KeyCode::Esc, KeyModifiers::NONE);
        assert!(!screen.is_editing());
        screen.handle_key(KeyCode::Char('i'), KeyModifiers::NONE);
        assert!(screen.is_editing());
    }
}
