use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::security::security_headers;
use axum::{Router, middleware};
use core_config::server::ServerConfig;
use std::future::IntoFuture;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};

/// Combines API routes with the cross-cutting middleware stack.
///
/// - API routes nested under `/api`
/// - Request tracing at INFO
/// - Security headers
/// - The given CORS layer
/// - Response compression
/// - 404 and 405 fallback handlers
///
/// Routes passed in should already have their state applied. Liveness
/// (`/health`) is merged by the caller so it sits outside `/api`.
pub fn create_router(apis: Router, cors: CorsLayer) -> Router {
    Router::new()
        .nest("/api", apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
}

/// Serves `router` until SIGINT/SIGTERM, then drains in-flight requests.
///
/// Requests still open `shutdown_timeout` after the signal are dropped.
///
/// # Errors
/// Returns an error if the listener fails to bind or the server fails while
/// running.
pub async fn create_production_app(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
) -> io::Result<()> {
    let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { coordinator.wait_for_signal().await })
        .into_future();

    let drain_deadline = async move {
        let _ = shutdown_rx.recv().await;
        info!("Draining connections (timeout: {:?})", shutdown_timeout);
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.inspect_err(|e| {
                tracing::error!("Server encountered an error: {:?}", e);
            })?;
            info!("Server stopped");
        }
        _ = drain_deadline => {
            warn!(
                "Graceful shutdown exceeded timeout of {:?}, dropping open connections",
                shutdown_timeout
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorResponse;
    use axum::{body::Body, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        let api = Router::new().route("/ping", get(|| async { "pong" }));
        create_router(api, CorsLayer::permissive())
    }

    #[tokio::test]
    async fn test_api_routes_are_nested() {
        let response = app()
            .oneshot(
                axum::http::Request::get("/api/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_unknown_route_uses_fallback() {
        let response = app()
            .oneshot(axum::http::Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "NOT_FOUND");
    }
}
