pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

/// Standard error response structure.
///
/// ```json
/// {
///   "code": 3001,
///   "error": "UPSTREAM_REJECTED",
///   "message": "resend rejected the message",
///   "details": null
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details (e.g., validation field errors)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Not Configured: {0}")]
    NotConfigured(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details, code) = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                (
                    json_rejection_status(&e),
                    e.body_text(),
                    None,
                    ErrorCode::JsonExtraction,
                )
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ValidationError.default_message().to_string(),
                    Some(validation_details(&e)),
                    ErrorCode::ValidationError,
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error_code = ErrorCode::BadRequest.code(), "Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg, None, ErrorCode::BadRequest)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    msg,
                    None,
                    ErrorCode::InternalError,
                )
            }
            AppError::BadGateway(msg) => {
                tracing::error!(
                    error_code = ErrorCode::UpstreamRejected.code(),
                    "Upstream rejected request: {}",
                    msg
                );
                (StatusCode::BAD_GATEWAY, msg, None, ErrorCode::UpstreamRejected)
            }
            AppError::NotConfigured(msg) => {
                tracing::error!(
                    error_code = ErrorCode::UpstreamNotConfigured.code(),
                    "Upstream not configured: {}",
                    msg
                );
                (
                    StatusCode::BAD_REQUEST,
                    msg,
                    None,
                    ErrorCode::UpstreamNotConfigured,
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!(
                    error_code = ErrorCode::ServiceUnavailable.code(),
                    "Service unavailable: {}",
                    msg
                );
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    msg,
                    None,
                    ErrorCode::ServiceUnavailable,
                )
            }
        };

        let body = match details {
            Some(details) => ErrorResponse::new(code, message).with_details(details),
            None => ErrorResponse::new(code, message),
        };

        (status, Json(body)).into_response()
    }
}

/// Body parse failures are client input errors and share the validation
/// status; content-type and buffering rejections keep their own.
fn json_rejection_status(rejection: &JsonRejection) -> StatusCode {
    match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            StatusCode::BAD_REQUEST
        }
        other => other.status(),
    }
}

/// Flattens validator errors into `{ field: [{ code, message, params }] }`.
fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let fields = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let entries: Vec<serde_json::Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::Value::Array(entries))
        })
        .collect::<serde_json::Map<_, _>>();

    serde_json::Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_bad_gateway_maps_to_502() {
        let response = AppError::BadGateway("resend rejected".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_configured_is_a_client_error() {
        let response = AppError::NotConfigured("no provider".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_details_lists_failing_fields() {
        let errors = Probe {
            email: "nope".into(),
        }
        .validate()
        .unwrap_err();

        let details = validation_details(&errors);
        let email = details["email"].as_array().unwrap();
        assert_eq!(email.len(), 1);
        assert_eq!(email[0]["code"], "email");
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let body = ErrorResponse::new(ErrorCode::NotFound, "missing");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], 1004);
        assert_eq!(json["error"], "NOT_FOUND");
        assert!(json.get("details").is_none());
    }
}
