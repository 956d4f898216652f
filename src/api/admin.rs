use axum::{extract::State, response::Html};
use std::sync::Arc;
use tracing::info;

use crate::api::error::ApiError;
use crate::api::templates;
use crate::state::AppState;

/// GET /admin - todos los tokens, más recientes primero
pub async fn list_tokens(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let tokens = state.store.list_all().await?;
    let counts = state.store.count_by_status().await?;

    info!("📋 Admin listing served ({} tokens)", tokens.len());
    Ok(Html(templates::admin_page(&tokens, counts)))
}
