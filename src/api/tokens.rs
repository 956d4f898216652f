// ============================================================================
// TOKEN PAGES - Emisión y validación de QR de un solo uso
// ============================================================================

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::Html,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::templates;
use crate::domains::tokens::{self, Holder};
use crate::state::AppState;

pub const REQUIRED_FIELDS_MESSAGE: &str = "Todos los campos son requeridos";

/// Campos del formulario de emisión. Los ausentes llegan como cadena vacía.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 20))]
    pub id_number: String,
}

impl GenerateForm {
    /// Recorta espacios y valida; devuelve el titular listo para persistir
    pub fn into_holder(self) -> Result<Holder, ApiError> {
        let form = GenerateForm {
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
            id_number: self.id_number.trim().to_string(),
        };

        if form.name.is_empty() || form.surname.is_empty() || form.id_number.is_empty() {
            return Err(ApiError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }

        if let Err(errors) = form.validate() {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|k| k.to_string())
                .collect();
            fields.sort();
            return Err(ApiError::Validation(format!(
                "Longitud máxima excedida: {}",
                fields.join(", ")
            )));
        }

        Ok(Holder::new(form.name, form.surname, form.id_number))
    }
}

/// GET /
pub async fn index() -> Html<String> {
    Html(templates::index_page())
}

/// POST /generate
pub async fn generate(
    State(state): State<Arc<AppState>>,
    form: Result<Form<GenerateForm>, FormRejection>,
) -> Result<Html<String>, ApiError> {
    // Sin Content-Type de formulario o cuerpo ilegible: se trata como campos ausentes
    let Form(form) = form.map_err(|rejection| {
        warn!("Rejected issuance request: {}", rejection.body_text());
        ApiError::Validation(REQUIRED_FIELDS_MESSAGE.to_string())
    })?;

    let holder = form.into_holder().map_err(|e| {
        warn!("Rejected issuance request: {}", e);
        e
    })?;

    let issued = state.issuer.issue(&holder).await?;
    info!("📱 QR generated for token {}", issued.token.id);

    Ok(Html(templates::issued_page(&issued)))
}

/// GET /validate/:token
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Html<String>, ApiError> {
    let outcome = tokens::validate(&state.store, &token).await?;
    Ok(Html(templates::validation_page(&outcome)))
}
