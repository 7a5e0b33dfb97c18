use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use axum_helpers::{AppError, ValidatedJson};
use domain_notifications::ChangeRequestContext;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::Accepted;
use crate::state::AppState;

/// A change request plus an optional recipient override.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleChangeRequest {
    #[serde(default)]
    #[validate(email)]
    pub to: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub request: ChangeRequestContext,
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/schedule-change", post(schedule_change))
        .with_state(state.clone())
}

async fn schedule_change(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ScheduleChangeRequest>,
) -> Result<(StatusCode, Json<Accepted>), AppError> {
    let to = payload
        .to
        .as_deref()
        .or(state.center_email.as_deref())
        .ok_or_else(|| {
            AppError::NotConfigured(
                "No recipient given and CENTER_EMAIL is not set".to_string(),
            )
        })?;

    let receipt = state
        .delivery
        .send_change_request(to, &payload.request)
        .await?;
    info!(
        id = %receipt.id,
        provider = %receipt.provider,
        student = %payload.request.student_name,
        "Schedule change request accepted"
    );

    Ok((StatusCode::ACCEPTED, Json(Accepted::from(&receipt))))
}
