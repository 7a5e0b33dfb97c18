//! # Axum Helpers
//!
//! Shared plumbing for the HTTP services in this workspace.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, liveness endpoint, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers)
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: Validated JSON extractor
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::{cors_layer, create_production_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let router = create_router(api_routes, cors_layer(&[])?).merge(health_router(app_info!()));
//! create_production_app(router, &ServerConfig::default(), Duration::from_secs(30)).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthResponse, ShutdownCoordinator, create_production_app, create_router, health_router,
    shutdown_signal,
};

pub use http::{cors_layer, parse_origins, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::ValidatedJson;
