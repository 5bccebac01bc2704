//! Markdown-to-HTML rendering for assistant messages.
//!
//! Renders the small Markdown dialect the chat backend produces (headings,
//! bold, italic, bullet and numbered items, rules, paragraphs) into an HTML
//! fragment. Input is entity-escaped before any tag is introduced, so raw HTML
//! in a reply is always displayed as text.
//!
//! Rendering is one-way: feeding the output back in escapes the generated
//! tags rather than reproducing them.

mod rules;

use tracing::instrument;

/// Render a chat reply to an HTML fragment.
///
/// Empty input renders to an empty string, without a paragraph wrapper.
#[instrument(level = "trace", skip_all, fields(len = text.len()))]
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    rules::run_pipeline(text)
}

/// Escape `&`, `<`, `>` without applying any Markdown rule.
pub fn escape_html(text: &str) -> String {
    rules::escape_entities(text)
}

/// Render untrusted text (what the user typed) for display: escaped, with
/// newlines turned into `<br>`, never interpreted as Markdown.
pub fn render_plain(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
