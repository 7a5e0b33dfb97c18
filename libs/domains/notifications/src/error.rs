//! Error types for the notifications domain.
//!
//! Provider failures are categorized to decide retry behavior:
//! - **Transient**: rate limits, 5xx, network trouble. Retried with backoff.
//! - **Permanent**: the transport rejected the request. Never retried.
//! - **Configuration**: nothing can be sent until the environment changes.

use crate::models::ProviderName;
use axum_helpers::AppError;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Category of error for determining retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
    Configuration,
}

impl ErrorCategory {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Transient)
    }
}

/// Errors that can occur in the notifications domain.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// No provider has a complete credential set, or a value is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Retryable transport failure.
    #[error("{provider} temporarily failed: {message}")]
    Transient {
        provider: ProviderName,
        message: String,
    },

    /// Transport rejected the message.
    #[error("{provider} rejected the message: {message}")]
    Permanent {
        provider: ProviderName,
        message: String,
    },

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    Template(String),

    /// Request data failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl NotificationError {
    pub fn transient(provider: ProviderName, message: impl Into<String>) -> Self {
        NotificationError::Transient {
            provider,
            message: message.into(),
        }
    }

    pub fn permanent(provider: ProviderName, message: impl Into<String>) -> Self {
        NotificationError::Permanent {
            provider,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            NotificationError::Transient { .. } => ErrorCategory::Transient,
            NotificationError::Configuration(_) => ErrorCategory::Configuration,
            NotificationError::Permanent { .. }
            | NotificationError::Template(_)
            | NotificationError::InvalidInput(_) => ErrorCategory::Permanent,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(err: handlebars::TemplateError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<validator::ValidationErrors> for NotificationError {
    fn from(err: validator::ValidationErrors) -> Self {
        NotificationError::InvalidInput(err.to_string())
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        NotificationError::Configuration(err.to_string())
    }
}

/// Convert NotificationError to AppError for standardized error responses.
///
/// Provider detail stays in the logs; clients only learn which provider failed.
impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Configuration(msg) => AppError::NotConfigured(msg),
            NotificationError::InvalidInput(msg) => AppError::BadRequest(msg),
            NotificationError::Permanent { provider, message } => {
                tracing::warn!(%provider, detail = %message, "Provider rejected message");
                AppError::BadGateway(format!("{provider} rejected the message"))
            }
            NotificationError::Transient { provider, message } => {
                tracing::warn!(%provider, detail = %message, "Provider unavailable after retries");
                AppError::ServiceUnavailable(format!("{provider} is temporarily unavailable"))
            }
            NotificationError::Template(msg) => {
                tracing::error!(detail = %msg, "Template rendering failed");
                AppError::InternalServerError("Failed to render email".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_categorization() {
        assert_eq!(
            NotificationError::transient(ProviderName::Resend, "429").category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            NotificationError::permanent(ProviderName::Smtp, "550").category(),
            ErrorCategory::Permanent
        );
        assert_eq!(
            NotificationError::Configuration("no provider".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            NotificationError::InvalidInput("to".into()).category(),
            ErrorCategory::Permanent
        );
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(NotificationError::transient(ProviderName::Sendgrid, "503").is_retryable());
        assert!(!NotificationError::permanent(ProviderName::Sendgrid, "400").is_retryable());
        assert!(!NotificationError::Configuration("missing".into()).is_retryable());
        assert!(!NotificationError::Template("bad".into()).is_retryable());
    }

    #[test]
    fn test_error_display_names_provider() {
        let err = NotificationError::permanent(ProviderName::Sendgrid, "invalid from address");
        assert_eq!(err.to_string(), "sendgrid rejected the message: invalid from address");
    }

    #[test]
    fn test_http_status_mapping() {
        let status = |err: NotificationError| AppError::from(err).into_response().status();

        assert_eq!(status(NotificationError::Configuration("none".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(NotificationError::InvalidInput("to".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(NotificationError::permanent(ProviderName::Resend, "bad from")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(NotificationError::transient(ProviderName::Resend, "503")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(NotificationError::Template("missing".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_provider_detail_is_not_exposed() {
        let app = AppError::from(NotificationError::permanent(
            ProviderName::Sendgrid,
            "The from address does not match a verified Sender Identity",
        ));
        assert_eq!(app.to_string(), "Bad Gateway: sendgrid rejected the message");
    }
}
