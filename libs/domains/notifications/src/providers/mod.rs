//! Email provider implementations.
//!
//! This module contains the `EmailProvider` trait and one implementation per
//! transport. Adapters are constructed once from configuration and shared
//! read-only between requests.

mod mock;
mod resend;
mod sendgrid;
mod smtp;

pub use mock::{MockOutcome, MockProvider};
pub use resend::{ResendConfig, ResendProvider};
pub use sendgrid::{SendGridConfig, SendGridProvider};
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::{NotificationError, NotificationResult};
use crate::models::ProviderName;
use crate::templates::RenderedEmail;
use async_trait::async_trait;
use reqwest::StatusCode;

/// Represents a sent email with provider-specific message ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentEmail {
    /// Provider-specific message ID for tracking.
    pub message_id: Option<String>,
}

/// Email content ready for sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailContent {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Option<String>,
}

impl EmailContent {
    pub fn new(to_email: impl Into<String>, rendered: RenderedEmail) -> Self {
        Self {
            to_email: to_email.into(),
            subject: rendered.subject,
            html_body: rendered.html,
            text_body: rendered.text,
            ..Default::default()
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// Trait for email sending providers.
///
/// `send` must classify every failure as transient or permanent; the retry
/// policy relies on it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email.
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    /// Get the provider name for logging.
    fn name(&self) -> ProviderName;
}

/// 408, 429 and 5xx are worth retrying; every other failure status is not.
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Turn a non-2xx HTTP response into a categorized error.
pub(crate) fn status_error(provider: ProviderName, status: StatusCode, detail: &str) -> NotificationError {
    let message = if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    };

    if is_transient_status(status) {
        NotificationError::transient(provider, message)
    } else {
        NotificationError::permanent(provider, message)
    }
}

/// Network-level failures are transient unless the request itself could not be built.
pub(crate) fn request_error(provider: ProviderName, err: reqwest::Error) -> NotificationError {
    if err.is_builder() {
        NotificationError::permanent(provider, format!("invalid request: {err}"))
    } else {
        NotificationError::transient(provider, format!("request failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        for code in [408, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(is_transient_status(status), "{code} should be transient");
        }
    }

    #[test]
    fn test_permanent_statuses() {
        for code in [400, 401, 403, 404, 413, 422] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(!is_transient_status(status), "{code} should be permanent");
        }
    }

    #[test]
    fn test_status_error_keeps_detail() {
        let err = status_error(ProviderName::Resend, StatusCode::UNPROCESSABLE_ENTITY, "bad to");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("bad to"));

        let err = status_error(ProviderName::Resend, StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_content_from_rendered() {
        let rendered = RenderedEmail {
            subject: "Hello".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        };
        let content = EmailContent::new("center@example.com", rendered).with_reply_to("mary@example.com");

        assert_eq!(content.to_email, "center@example.com");
        assert_eq!(content.subject, "Hello");
        assert_eq!(content.text_body, "Hi");
        assert_eq!(content.reply_to.as_deref(), Some("mary@example.com"));
        assert!(content.cc.is_empty());
    }
}
