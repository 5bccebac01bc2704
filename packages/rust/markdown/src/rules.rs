//! Ordered rule passes for the chat Markdown dialect.
//!
//! Each pass is a function `&str -> String` applied in sequence. Later passes
//! see the output of earlier ones, so the order in [`run_pipeline`] is part of
//! the rendering contract.

use std::sync::LazyLock;

use regex::Regex;

/// Run every rule pass, in order, on non-empty input.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = escape_entities(text);

    result = headings(&result);
    result = bold(&result);
    result = italic(&result);
    result = bullet_items(&result);
    result = group_list_items(&result);
    result = numbered_items(&result);
    result = horizontal_rules(&result);
    result = line_breaks(&result);
    result = wrap_paragraph(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Entity escaping
// ---------------------------------------------------------------------------

/// Escape `&`, `<`, `>`. `&` goes first so the other entities survive.
pub(crate) fn escape_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Pass 2: Headings
// ---------------------------------------------------------------------------

/// `### text` and `## text` at line start. Level 3 runs first so its prefix
/// is not claimed by the level 2 rule.
fn headings(text: &str) -> String {
    static H3_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?mR)^### (.+)$").expect("valid regex"));
    static H2_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?mR)^## (.+)$").expect("valid regex"));

    let result = H3_RE.replace_all(text, r#"<h3 class="nuru-h3">$1</h3>"#);
    H2_RE
        .replace_all(&result, r#"<h2 class="nuru-h2">$1</h2>"#)
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: Bold
// ---------------------------------------------------------------------------

/// `**text**`, non-greedy so `**a** and **b**` stays two spans.
fn bold(text: &str) -> String {
    static BOLD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));

    BOLD_RE
        .replace_all(text, "<strong>$1</strong>")
        .into_owned()
}

// ---------------------------------------------------------------------------
// Pass 4: Italic
// ---------------------------------------------------------------------------

/// `*text*` where neither delimiter touches another asterisk.
///
/// Equivalent to `(?<!\*)\*(?!\*)(.+?)(?<!\*)\*(?!\*)`; `regex` has no
/// lookaround, so the delimiters are matched by hand. Neighbour checks look at
/// the pass input, as lookbehind would, and the body never crosses a line.
fn italic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let is_star = |idx: Option<usize>| idx.and_then(|i| chars.get(i)) == Some(&'*');
    let lone_star = |i: usize| {
        chars[i] == '*' && !is_star(i.checked_sub(1)) && !is_star(Some(i + 1))
    };

    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if lone_star(i) {
            if let Some(close) = find_italic_close(&chars, i, &lone_star) {
                out.push_str("<em>");
                out.extend(&chars[i + 1..close]);
                out.push_str("</em>");
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// First lone `*` after at least one body char, without leaving the line.
fn find_italic_close(
    chars: &[char],
    open: usize,
    lone_star: &impl Fn(usize) -> bool,
) -> Option<usize> {
    let mut j = open + 1;
    while j < chars.len() && !matches!(chars[j], '\n' | '\r') {
        if j > open + 1 && lone_star(j) {
            return Some(j);
        }
        j += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Pass 5: Bullet lists
// ---------------------------------------------------------------------------

/// `- text` or `• text` lines become list items.
fn bullet_items(text: &str) -> String {
    static BULLET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?mR)^[-•] (.+)$").expect("valid regex"));

    BULLET_RE.replace_all(text, "<li>$1</li>").into_owned()
}

/// Wrap each run of adjacent list items (with their trailing newlines) in one
/// `<ul>`.
fn group_list_items(text: &str) -> String {
    static RUN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?:<li>.*</li>\n?)+").expect("valid regex"));

    RUN_RE.replace_all(text, "<ul>$0</ul>").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 6: Numbered lists
// ---------------------------------------------------------------------------

/// `N. text` lines become list items. These run after grouping and are
/// intentionally left without an `<ol>` wrapper.
fn numbered_items(text: &str) -> String {
    static NUMBERED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?mR)^\d+\. (.+)$").expect("valid regex"));

    NUMBERED_RE.replace_all(text, "<li>$1</li>").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 7: Horizontal rules
// ---------------------------------------------------------------------------

/// A line of three or more dashes.
fn horizontal_rules(text: &str) -> String {
    static HR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?mR)^---+$").expect("valid regex"));

    HR_RE.replace_all(text, "<hr>").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 8: Paragraphs and line breaks
// ---------------------------------------------------------------------------

/// Blank line → paragraph break, remaining newlines → `<br>`.
fn line_breaks(text: &str) -> String {
    text.replace("\n\n", "</p><p>").replace('\n', "<br>")
}

// ---------------------------------------------------------------------------
// Pass 9: Outer paragraph
// ---------------------------------------------------------------------------

/// Wrap in `<p>` unless the fragment already opens with a block element.
fn wrap_paragraph(text: &str) -> String {
    const BLOCK_PREFIXES: [&str; 4] = ["<h2", "<h3", "<hr", "<ul"];

    if BLOCK_PREFIXES.iter().any(|p| text.starts_with(p)) || text.starts_with("<li>") {
        text.to_string()
    } else {
        format!("<p>{text}</p>")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
