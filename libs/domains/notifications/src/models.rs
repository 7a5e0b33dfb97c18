//! Data models for the notifications domain.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Request payloads
// ============================================================================

/// A parent's request to change a student's tutoring schedule.
///
/// Every free-text field is untrusted and is escaped by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestContext {
    #[validate(length(min = 1, max = 100))]
    pub parent_name: String,
    #[validate(email, length(max = 255))]
    pub parent_email: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub parent_phone: String,
    #[validate(length(min = 1, max = 100))]
    pub student_name: String,
    #[serde(default)]
    #[validate(length(max = 64))]
    pub student_id: String,
    #[validate(length(min = 1, max = 500))]
    pub current_schedule: String,
    #[validate(length(min = 1, max = 500))]
    pub requested_change: String,
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
    #[validate(length(min = 1, max = 100))]
    pub effective_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub additional_notes: Option<String>,
}

/// Free-form message from a parent about a student.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParentMessage {
    #[validate(email, length(max = 255))]
    pub to: String,
    #[validate(length(min = 1, max = 100))]
    pub student_name: String,
    #[validate(length(min = 1, max = 100))]
    pub parent_name: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

// ============================================================================
// Delivery bookkeeping
// ============================================================================

/// Transport a message can be delivered through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderName {
    Resend,
    Sendgrid,
    Smtp,
}

/// Result of a single send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    TransientFailure,
    PermanentFailure,
}

/// One iteration of the retry loop. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAttempt {
    pub provider: ProviderName,
    pub attempt_number: u32,
    pub outcome: AttemptOutcome,
}

/// Returned for every message the transport accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub id: Uuid,
    pub provider: ProviderName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub attempts: Vec<DeliveryAttempt>,
}
