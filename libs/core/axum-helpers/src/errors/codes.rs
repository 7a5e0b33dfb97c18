//! Type-safe error codes for API responses.
//!
//! Each error code carries:
//! - String representation for client consumption (e.g., "VALIDATION_ERROR")
//! - Integer code for logging and monitoring (e.g., 1001)
//! - Default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::ValidationError;
//! assert_eq!(code.as_str(), "VALIDATION_ERROR");
//! assert_eq!(code.code(), 1001);
//! assert_eq!(code.default_message(), "Request validation failed");
//! ```

use serde::{Deserialize, Serialize};

/// Standardized error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request validation failed
    ValidationError,

    /// JSON extraction from request body failed
    JsonExtraction,

    /// Requested resource was not found
    NotFound,

    /// The route exists but not for this method
    MethodNotAllowed,

    /// Request was well-formed but could not be acted on
    BadRequest,

    // Server errors
    /// An unexpected internal server error occurred
    InternalError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    // Upstream errors (3000-3999)
    /// An upstream service rejected the request
    UpstreamRejected,

    /// No upstream service is configured to handle the request
    UpstreamNotConfigured,
}

impl ErrorCode {
    /// Machine-readable identifier sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::UpstreamRejected => "UPSTREAM_REJECTED",
            Self::UpstreamNotConfigured => "UPSTREAM_NOT_CONFIGURED",
        }
    }

    /// Integer code for logs and dashboards.
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::ServiceUnavailable => 1011,
            Self::MethodNotAllowed => 1012,
            Self::BadRequest => 1013,

            Self::UpstreamRejected => 3001,
            Self::UpstreamNotConfigured => 3002,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::BadRequest => "The request could not be processed",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::UpstreamRejected => "The upstream service rejected the request",
            Self::UpstreamNotConfigured => "No upstream service is configured",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
