use axum::Router;
use domain_notifications::DeliveryReceipt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod health;
pub mod links;
pub mod notify;
pub mod schedule;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix is added by the `create_router` helper.
///
/// Returns a stateless Router (all sub-routers have state already applied).
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new()
        .merge(notify::router(state))
        .merge(schedule::router(state))
        .nest(
            "/email",
            links::router(state).merge(health::router(state)),
        )
}

/// Body of a 202 response from the delivery endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Accepted {
    pub ok: bool,
    pub id: Uuid,
}

impl From<&DeliveryReceipt> for Accepted {
    fn from(receipt: &DeliveryReceipt) -> Self {
        Self {
            ok: true,
            id: receipt.id,
        }
    }
}
