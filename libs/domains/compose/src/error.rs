//! Error types for compose-link construction and dispatch.

use thiserror::Error;

/// Result type for compose operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors surfaced by the compose path.
///
/// Channel unavailability is never an error here; it degrades to the next
/// channel. Only a missing or unusable recipient stops a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// No recipient address was supplied.
    #[error("A recipient address is required")]
    MissingRecipient,

    /// The recipient is not a single, syntactically valid address.
    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    /// A single link variant could not be produced.
    #[error("Could not build {variant} link: {reason}")]
    InvalidLink {
        variant: &'static str,
        reason: String,
    },
}
