//! Server infrastructure module.
//!
//! This module provides:
//! - Router assembly with the shared middleware stack
//! - The liveness endpoint
//! - Graceful shutdown coordination
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig};
//!
//! let router = create_router(api_routes, cors).merge(health_router(app_info!()));
//! create_production_app(router, &ServerConfig::default(), Duration::from_secs(30)).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthResponse, health_router};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
