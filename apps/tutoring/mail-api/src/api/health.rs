use axum::{Json, Router, extract::State, routing::get};
use domain_notifications::{DeliveryService, ProviderStatus};
use std::sync::Arc;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/health", get(provider_health))
        .with_state(state.delivery.clone())
}

/// Which providers have credentials and which one delivery will use.
async fn provider_health(State(service): State<Arc<DeliveryService>>) -> Json<ProviderStatus> {
    Json(service.provider_status().clone())
}
