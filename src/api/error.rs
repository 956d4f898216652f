use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domains::tokens::TokenError;

/// Errores HTTP del servicio. El cuerpo siempre es `{"error": "<mensaje>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("No autorizado")]
    Unauthorized,

    #[error("Error interno: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensaje expuesto al cliente; los errores internos no filtran detalles
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Error interno del servidor".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("API Error: {}", self);
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
