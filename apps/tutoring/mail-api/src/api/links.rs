use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::USER_AGENT},
    routing::post,
};
use axum_helpers::AppError;
use domain_compose::{EmailLinks, EmailParams, LinkBuilder, PlatformClass};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub platform: PlatformClass,
    pub links: EmailLinks,
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/links", post(compose_links))
        .with_state(state.links)
}

/// Build every compose link for the caller's platform, judged by User-Agent.
async fn compose_links(
    State(links): State<LinkBuilder>,
    headers: HeaderMap,
    payload: Result<Json<EmailParams>, JsonRejection>,
) -> Result<Json<LinksResponse>, AppError> {
    let Json(params) = payload?;

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let platform = PlatformClass::detect_optional(user_agent);

    let links = links
        .build(&params, platform)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(Json(LinksResponse { platform, links }))
}
