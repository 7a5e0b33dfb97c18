use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use axum_helpers::{AppError, ValidatedJson};
use domain_notifications::{DeliveryService, ParentMessage};
use std::sync::Arc;
use tracing::info;

use super::Accepted;
use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/notify", post(notify))
        .with_state(state.delivery.clone())
}

/// Render the parent-message template and deliver it.
async fn notify(
    State(service): State<Arc<DeliveryService>>,
    ValidatedJson(message): ValidatedJson<ParentMessage>,
) -> Result<(StatusCode, Json<Accepted>), AppError> {
    let receipt = service.send_parent_message(&message).await?;
    info!(id = %receipt.id, provider = %receipt.provider, "Parent message accepted");

    Ok((StatusCode::ACCEPTED, Json(Accepted::from(&receipt))))
}
