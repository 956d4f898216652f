//! Máquina de estados de validación: NOT_FOUND, PENDING, USED

use tracing::{info, warn};

use super::models::{Token, TokenError};
use super::store::TokenStore;
use crate::observability::metrics::record_validation;

/// Resultado visible para quien presenta el token
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// PENDING → USED aplicado; incluye los datos del titular
    Success(Token),
    /// El token ya estaba USED, sin mutación
    AlreadyUsed,
    /// El token no existe, sin mutación
    Invalid,
}

impl ValidationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ValidationOutcome::Success(_) => "success",
            ValidationOutcome::AlreadyUsed => "already_used",
            ValidationOutcome::Invalid => "invalid",
        }
    }
}

/// Valida y consume un token. Solo los errores de almacenamiento salen como `Err`.
pub async fn validate(store: &TokenStore, token: &str) -> Result<ValidationOutcome, TokenError> {
    let outcome = match store.mark_used(token).await {
        Ok(used) => {
            info!("✅ Token {} validated for {} {}", used.id, used.holder_name, used.holder_surname);
            ValidationOutcome::Success(used)
        }
        Err(TokenError::AlreadyUsed) => {
            warn!("⚠️ Token already used presented again");
            ValidationOutcome::AlreadyUsed
        }
        Err(TokenError::NotFound) => {
            warn!("🚫 Unknown token presented for validation");
            ValidationOutcome::Invalid
        }
        Err(e) => return Err(e),
    };

    record_validation(outcome.label());
    Ok(outcome)
}
