//! Plain-text derivation from rendered HTML.

use domain_compose::sanitize::unescape_html;
use regex::Regex;
use std::sync::LazyLock;

static INVISIBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<head\b.*?</head>|<style\b.*?</style>|<script\b.*?</script>|<!--.*?-->")
        .expect("invisible-content pattern is valid")
});

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|table|ul|ol|section|blockquote)\s*>")
        .expect("line-break pattern is valid")
});

static CELL_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</t[dh]\s*>").expect("cell-break pattern is valid"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("space pattern is valid"));

/// Strip markup from `html`, keeping every piece of visible text.
///
/// Block ends become line breaks, table cells are separated by a space, runs
/// of horizontal whitespace collapse to one space, and at most one blank line
/// is kept between paragraphs.
pub fn html_to_text(html: &str) -> String {
    let visible = INVISIBLE.replace_all(html, "");
    let broken = LINE_BREAK.replace_all(&visible, "\n");
    let celled = CELL_BREAK.replace_all(&broken, " ");
    let stripped = TAG.replace_all(&celled, "");
    let decoded = unescape_html(&stripped);

    let mut out = String::with_capacity(decoded.len());
    let mut blank_run = 0;
    for line in decoded.lines() {
        let line = HORIZONTAL_SPACE.replace_all(line, " ");
        let line = line.trim();
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 1 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}
