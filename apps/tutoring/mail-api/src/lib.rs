//! Tutoring Mail API
//!
//! HTTP front for the tutoring center's outbound email.
//!
//! ## Routes
//!
//! ```text
//! POST /api/notify            parent message → rendered → delivered (202)
//! POST /api/schedule-change   change request → rendered → delivered (202)
//! POST /api/email/links       compose links for the caller's platform
//! GET  /api/email/health      configured / selected provider
//! GET  /health                liveness
//! ```
//!
//! Missing provider credentials do not stop the service from starting; the
//! health route reports no provider and delivery requests fail with 400.

use axum::Router;
use axum_helpers::{cors_layer, create_production_app, create_router, health_router};
use core_config::AppInfo;
use domain_notifications::DeliveryService;
use eyre::{Result, WrapErr};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub mod api;
pub mod config;
pub mod state;

use config::Config;
use state::AppState;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Assemble the full application router.
pub fn app(state: &AppState, cors: CorsLayer, app_info: AppInfo) -> Router {
    create_router(api::routes(state), cors).merge(health_router(app_info))
}

/// Run the mail API until SIGINT/SIGTERM.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be parsed
/// - The template renderer fails to initialize
/// - The listener cannot bind
pub async fn run() -> Result<()> {
    core_config::load_dotenv();

    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment);

    info!(
        name = %config.app.name,
        version = %config.app.version,
        "Starting tutoring mail API"
    );
    info!("Environment: {:?}", config.environment);

    let delivery = DeliveryService::from_config(&config.email)
        .wrap_err("Failed to initialize delivery service")?;

    let status = delivery.provider_status();
    match status.selected {
        Some(provider) => info!(%provider, configured = ?status.configured, "Email provider selected"),
        None => warn!("No email provider configured; delivery requests will be rejected"),
    }
    if config.center_email.is_none() {
        warn!("CENTER_EMAIL not set; schedule change requests must name a recipient");
    }

    let cors = cors_layer(&config.cors_origins).wrap_err("Invalid CORS_ALLOWED_ORIGIN")?;
    let state = AppState::new(delivery, config.center_email.clone());
    let router = app(&state, cors, config.app);

    info!("Starting mail API with graceful shutdown ({:?} drain)", SHUTDOWN_TIMEOUT);
    create_production_app(router, &config.server, SHUTDOWN_TIMEOUT)
        .await
        .wrap_err("Server error")?;

    info!("Tutoring mail API shutdown complete");
    Ok(())
}
