use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod domains;
pub mod observability;
pub mod security;
pub mod state;

use api::create_api_router;
use observability::metrics_middleware;
use security::security_headers_middleware;
use state::AppState;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    create_api_router(app_state.clone())
        // Aplicar el estado a todas las rutas
        .with_state(app_state)
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(16 * 1024)) // formularios pequeños
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .deflate(true)
                .compress_when(SizeAbove::new(1024)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(security_headers_middleware))
}
