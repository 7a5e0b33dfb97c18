//! Compose URI construction.
//!
//! Every variant is built from the same [`SanitizedEmail`], independently of
//! the others. A variant that cannot be built is left out without affecting
//! the rest; only `mailto` is mandatory.

use crate::error::{ComposeError, ComposeResult};
use crate::models::{EmailLinks, EmailParams};
use crate::platform::PlatformClass;
use crate::sanitize::{ContentLimits, SanitizedEmail, encode_component, sanitize, to_crlf};
use tracing::{debug, warn};

/// Native intents fail silently above this length, so longer deep links are dropped.
pub const MAX_NATIVE_URI_LEN: usize = 2000;

/// Gmail web compose links above this length are dropped; dispatch then goes
/// straight to `mailto`.
pub const MAX_WEB_URI_LEN: usize = 8000;

const GMAIL_WEB_BASE: &str = "https://mail.google.com/mail/?view=cm&fs=1";
const GMAIL_IOS_BASE: &str = "googlegmail://co";
const GMAIL_ANDROID_BASE: &str = "intent://co";
const GMAIL_ANDROID_SUFFIX: &str = "#Intent;scheme=googlegmail;package=com.google.android.gm;end";
const OUTLOOK_BASE: &str = "https://outlook.office.com/mail/deeplink/compose";

/// Query-string accumulator that skips empty values.
#[derive(Default)]
struct Query {
    pairs: Vec<String>,
}

impl Query {
    fn push(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.pairs.push(format!("{key}={}", encode_component(value)));
        }
        self
    }

    /// Append to `base`, starting with `?` unless `base` already has a query.
    fn append_to(&self, base: &str) -> String {
        if self.pairs.is_empty() {
            return base.to_string();
        }
        let sep = if base.contains('?') { '&' } else { '?' };
        format!("{base}{sep}{}", self.pairs.join("&"))
    }
}

/// `mailto:<to>?cc=&bcc=&subject=&body=`
pub fn mailto_link(email: &SanitizedEmail) -> String {
    let base = format!("mailto:{}", encode_component(email.to()));
    Query::default()
        .push("cc", email.cc())
        .push("bcc", email.bcc())
        .push("subject", Some(email.subject()))
        .push("body", Some(email.body()))
        .append_to(&base)
}

/// Gmail web compose. The subject key is `su`.
pub fn gmail_web_link(email: &SanitizedEmail) -> String {
    Query::default()
        .push("to", Some(email.to()))
        .push("cc", email.cc())
        .push("bcc", email.bcc())
        .push("su", Some(email.subject()))
        .push("body", Some(email.body()))
        .append_to(GMAIL_WEB_BASE)
}

/// Outlook web compose. Takes `to`, `subject` and `body` only.
pub fn outlook_link(email: &SanitizedEmail) -> String {
    Query::default()
        .push("to", Some(email.to()))
        .push("subject", Some(email.subject()))
        .push("body", Some(email.body()))
        .append_to(OUTLOOK_BASE)
}

/// Gmail app deep link for `platform`, or `None` on desktop.
///
/// Takes `to`, `subject` and `body` only; the body uses CRLF line breaks.
pub fn gmail_app_link(email: &SanitizedEmail, platform: PlatformClass) -> Option<String> {
    let body = to_crlf(email.body());
    let mut query = Query::default();
    query
        .push("to", Some(email.to()))
        .push("subject", Some(email.subject()))
        .push("body", Some(&body));

    match platform {
        PlatformClass::Ios => Some(query.append_to(GMAIL_IOS_BASE)),
        PlatformClass::Android => Some(format!(
            "{}{GMAIL_ANDROID_SUFFIX}",
            query.append_to(GMAIL_ANDROID_BASE)
        )),
        PlatformClass::Desktop => None,
    }
}

/// Builds [`EmailLinks`] from caller input.
#[derive(Debug, Clone, Copy)]
pub struct LinkBuilder {
    limits: ContentLimits,
    max_native_uri_len: usize,
    max_web_uri_len: usize,
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self {
            limits: ContentLimits::default(),
            max_native_uri_len: MAX_NATIVE_URI_LEN,
            max_web_uri_len: MAX_WEB_URI_LEN,
        }
    }
}

impl LinkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_max_native_uri_len(mut self, len: usize) -> Self {
        self.max_native_uri_len = len;
        self
    }

    pub fn with_max_web_uri_len(mut self, len: usize) -> Self {
        self.max_web_uri_len = len;
        self
    }

    pub fn limits(&self) -> ContentLimits {
        self.limits
    }

    /// Build every variant that applies to `platform`.
    ///
    /// Fails only when the recipient is missing or invalid, since without it
    /// not even `mailto` can be produced.
    pub fn build(&self, params: &EmailParams, platform: PlatformClass) -> ComposeResult<EmailLinks> {
        let email = sanitize(params, self.limits)?;

        let mailto = mailto_link(&email);
        if mailto.len() > self.max_native_uri_len {
            warn!(len = mailto.len(), "mailto link exceeds native length ceiling");
        }

        let links = EmailLinks {
            mailto,
            gmail_web: self.web_variant(&email),
            gmail_app: self.native_variant(&email, platform),
            outlook: Some(outlook_link(&email)),
        };

        debug!(
            %platform,
            has_app_link = links.gmail_app.is_some(),
            "Built compose links"
        );
        Ok(links)
    }

    fn web_variant(&self, email: &SanitizedEmail) -> Option<String> {
        within_ceiling("gmail_web", gmail_web_link(email), self.max_web_uri_len)
            .inspect_err(|e| warn!(error = %e, "Skipping web compose link"))
            .ok()
    }

    fn native_variant(&self, email: &SanitizedEmail, platform: PlatformClass) -> Option<String> {
        let uri = gmail_app_link(email, platform)?;
        within_ceiling("gmail_app", uri, self.max_native_uri_len)
            .inspect_err(|e| warn!(error = %e, "Skipping native app link"))
            .ok()
    }
}

fn within_ceiling(variant: &'static str, uri: String, ceiling: usize) -> ComposeResult<String> {
    if uri.len() > ceiling {
        return Err(ComposeError::InvalidLink {
            variant,
            reason: format!("{} characters exceeds {ceiling}", uri.len()),
        });
    }
    Ok(uri)
}
