use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Parses a comma-separated origin list, skipping blank entries.
pub fn parse_origins(raw: &str) -> io::Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid CORS origin '{}': {}", s, e),
                )
            })
        })
        .collect()
}

/// Creates the CORS layer for API services.
///
/// With no origins the layer is permissive, which is only meant for local
/// development. Otherwise the listed origins may call GET, POST and OPTIONS
/// with `Content-Type`/`Accept` headers, cached for an hour.
pub fn cors_layer(origins: &[String]) -> io::Result<CorsLayer> {
    if origins.is_empty() {
        warn!("CORS_ALLOWED_ORIGIN not set, allowing any origin");
        return Ok(CorsLayer::permissive());
    }

    let allowed = parse_origins(&origins.join(","))?;
    if allowed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "CORS_ALLOWED_ORIGIN cannot be empty",
        ));
    }

    info!("CORS configured with allowed origins: {}", origins.join(", "));

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600)))
}
