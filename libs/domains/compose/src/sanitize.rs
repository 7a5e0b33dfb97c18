//! Content sanitizing shared by every compose variant and by HTML templates.
//!
//! Truncation happens once, on the structured content, before any
//! variant-specific encoding. Every link variant therefore carries the same
//! subject and body text.

use crate::error::{ComposeError, ComposeResult};
use crate::models::EmailParams;
use std::borrow::Cow;
use tracing::{debug, warn};
use validator::ValidateEmail;

/// Body ceiling in characters. Keeps encoded compose URIs under the ~2000
/// character limit browsers and OS handlers reliably open.
pub const DEFAULT_BODY_LIMIT: usize = 1500;

/// Subject ceiling in characters.
pub const DEFAULT_SUBJECT_LIMIT: usize = 200;

/// Appended once to a body cut at the ceiling.
pub const BODY_TRUNCATION_MARKER: &str = "\n\n[...truncated]";

/// Appended once to a subject cut at the ceiling.
pub const SUBJECT_ELLIPSIS: &str = "...";

/// Character ceilings applied before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLimits {
    pub body_chars: usize,
    pub subject_chars: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            body_chars: DEFAULT_BODY_LIMIT,
            subject_chars: DEFAULT_SUBJECT_LIMIT,
        }
    }
}

/// Compose content that has been validated and truncated.
///
/// Only obtainable through [`sanitize`], so link builders cannot encode raw
/// caller input by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedEmail {
    to: String,
    cc: Option<String>,
    bcc: Option<String>,
    subject: String,
    body: String,
}

impl SanitizedEmail {
    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn cc(&self) -> Option<&str> {
        self.cc.as_deref()
    }

    pub fn bcc(&self) -> Option<&str> {
        self.bcc.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Validate the recipient and cap subject and body.
///
/// Text below the ceilings passes through unchanged, line breaks included;
/// percent-encoding carries them into every link.
///
/// A missing or invalid `to` is the only failure. Invalid `cc`/`bcc` values
/// are dropped rather than failing the whole compose.
pub fn sanitize(params: &EmailParams, limits: ContentLimits) -> ComposeResult<SanitizedEmail> {
    let to = params.to.trim();
    if to.is_empty() {
        return Err(ComposeError::MissingRecipient);
    }
    if !is_valid_address(to) {
        return Err(ComposeError::InvalidAddress(to.to_string()));
    }

    let subject = truncate_subject(&params.subject, limits.subject_chars).into_owned();
    let body = match truncate_body(&params.body, limits.body_chars) {
        Cow::Borrowed(body) => body.to_string(),
        Cow::Owned(body) => {
            debug!(limit = limits.body_chars, "Compose body truncated");
            body
        }
    };

    Ok(SanitizedEmail {
        to: to.to_string(),
        cc: optional_address("cc", params.cc.as_deref()),
        bcc: optional_address("bcc", params.bcc.as_deref()),
        subject,
        body,
    })
}

fn optional_address(field: &'static str, value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if is_valid_address(value) {
        Some(value.to_string())
    } else {
        warn!(field, "Dropping invalid optional address");
        None
    }
}

/// True for exactly one syntactically valid address.
pub fn is_valid_address(address: &str) -> bool {
    !address.contains([',', ';']) && address.validate_email()
}

/// Cut `body` to `limit` characters and append [`BODY_TRUNCATION_MARKER`].
pub fn truncate_body(body: &str, limit: usize) -> Cow<'_, str> {
    truncate_with(body, limit, BODY_TRUNCATION_MARKER)
}

/// Cut `subject` to `limit` characters and append [`SUBJECT_ELLIPSIS`].
pub fn truncate_subject(subject: &str, limit: usize) -> Cow<'_, str> {
    truncate_with(subject, limit, SUBJECT_ELLIPSIS)
}

fn truncate_with<'a>(text: &'a str, limit: usize, marker: &str) -> Cow<'a, str> {
    match text.char_indices().nth(limit) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + marker.len());
            out.push_str(&text[..cut]);
            out.push_str(marker);
            Cow::Owned(out)
        }
    }
}

/// Percent-encode a query component. Only `A-Z a-z 0-9 - _ . ~` pass through.
pub fn encode_component(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Normalize every line break to CRLF, as mail-app intents expect.
pub fn to_crlf(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\r\n")
}

/// Escape `& < > " '` for interpolation into HTML text or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverse of [`escape_html`] for the five entities it emits, plus `&nbsp;`.
pub fn unescape_html(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_body_is_untouched() {
        assert!(matches!(truncate_body("hello", 10), Cow::Borrowed("hello")));
    }

    #[test]
    fn test_long_body_is_capped_with_single_marker() {
        let body = "x".repeat(DEFAULT_BODY_LIMIT * 2);
        let out = truncate_body(&body, DEFAULT_BODY_LIMIT);

        assert!(out.chars().count() <= DEFAULT_BODY_LIMIT + BODY_TRUNCATION_MARKER.chars().count());
        assert_eq!(out.matches(BODY_TRUNCATION_MARKER).count(), 1);
        assert!(out.ends_with(BODY_TRUNCATION_MARKER));
    }

    #[test]
    fn test_body_at_exact_limit_is_untouched() {
        let body = "y".repeat(DEFAULT_BODY_LIMIT);
        assert_eq!(truncate_body(&body, DEFAULT_BODY_LIMIT), body);
    }

    #[test]
    fn test_truncation_respects_multibyte_boundaries() {
        let body = "é".repeat(20);
        let out = truncate_body(&body, 5);
        assert!(out.starts_with("ééééé\n"));
        assert_eq!(out.chars().filter(|c| *c == 'é').count(), 5);
    }

    #[test]
    fn test_subject_is_capped_with_ellipsis() {
        let subject = "s".repeat(250);
        let out = truncate_subject(&subject, DEFAULT_SUBJECT_LIMIT);
        assert_eq!(out.chars().count(), DEFAULT_SUBJECT_LIMIT + SUBJECT_ELLIPSIS.len());
        assert!(out.ends_with(SUBJECT_ELLIPSIS));
    }

    #[test]
    fn test_sanitize_requires_recipient() {
        let err = sanitize(&EmailParams::new("   "), ContentLimits::default()).unwrap_err();
        assert_eq!(err, ComposeError::MissingRecipient);
    }

    #[test]
    fn test_sanitize_rejects_multiple_recipients() {
        let params = EmailParams::new("a@example.com,b@example.com");
        let err = sanitize(&params, ContentLimits::default()).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidAddress(_)));
    }

    #[test]
    fn test_sanitize_drops_invalid_cc_and_keeps_subject_lines() {
        let params = EmailParams::new(" center@example.com ")
            .with_cc("not an address")
            .with_bcc("office@example.com")
            .with_subject("Line one\r\nLine two");

        let clean = sanitize(&params, ContentLimits::default()).unwrap();
        assert_eq!(clean.to(), "center@example.com");
        assert_eq!(clean.cc(), None);
        assert_eq!(clean.bcc(), Some("office@example.com"));
        assert_eq!(clean.subject(), "Line one\r\nLine two");
    }

    #[test]
    fn test_body_one_past_limit_is_truncated() {
        let body = "z".repeat(11);
        let clean = sanitize(
            &EmailParams::new("center@example.com").with_body(body),
            ContentLimits {
                body_chars: 10,
                subject_chars: DEFAULT_SUBJECT_LIMIT,
            },
        )
        .unwrap();

        assert_eq!(clean.body(), format!("{}{BODY_TRUNCATION_MARKER}", "z".repeat(10)));
    }

    #[test]
    fn test_encode_component_uses_percent_twenty_for_spaces() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("–"), "%E2%80%93");
    }

    #[test]
    fn test_to_crlf_normalizes_mixed_breaks() {
        assert_eq!(to_crlf("a\nb\r\nc\rd"), "a\r\nb\r\nc\r\nd");
    }

    #[test]
    fn test_escape_html_round_trip() {
        let raw = r#"<b>"Tom" & 'Jerry'</b>"#;
        let escaped = escape_html(raw);
        assert_eq!(
            escaped,
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(unescape_html(&escaped), raw);
    }
}
