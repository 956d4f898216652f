use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if db::check_health(state.store.pool()).await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        tracing::error!("❌ Health check failed: token store unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}

/// GET /metrics - registro global de Prometheus en formato texto
pub async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!("❌ Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response();
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
