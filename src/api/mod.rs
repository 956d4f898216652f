pub mod admin;
pub mod error;
pub mod system;
pub mod templates;
pub mod tokens;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::security::require_admin_token;
use crate::state::AppState;

/// Crea el router con todas las rutas del servicio
pub fn create_api_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/admin", get(admin::list_tokens))
        .layer(from_fn_with_state(app_state, require_admin_token));

    Router::new()
        .route("/", get(tokens::index))
        .route("/generate", post(tokens::generate))
        .route("/validate/:token", get(tokens::validate_token))
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .merge(admin_routes)
}
