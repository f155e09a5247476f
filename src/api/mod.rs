//! Dashboard HTTP API
//!
//! Serves the dashboard's data under `/api/v1` with the `{ data, meta }` /
//! `{ error, meta }` envelope, plus a bare `/health` at the root.

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::DashboardState;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding comma-separated allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "GRID_CARBON_CORS_ORIGINS";

/// Origins listed in a `GRID_CARBON_CORS_ORIGINS` value. Entries that are
/// not valid header values are skipped.
fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| o.parse().ok())
        .collect()
}

/// Same-origin unless `GRID_CARBON_CORS_ORIGINS` lists other origins, e.g.
/// a dashboard dev server.
fn build_cors_layer() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let Ok(raw) = std::env::var(CORS_ORIGINS_ENV) else {
        return layer;
    };
    let origins = parse_origins(&raw);
    tracing::info!(count = origins.len(), origins = %raw, "CORS: allowing configured origins");
    layer.allow_origin(origins)
}

/// Dashboard router: versioned API, root `/health`, request tracing, gzip.
pub fn create_app(state: DashboardState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::legacy_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer())
}
