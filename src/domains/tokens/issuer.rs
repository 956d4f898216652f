use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use tracing::{error, info, warn};

use super::models::{Holder, Token, TokenError};
use super::store::TokenStore;
use crate::domains::qr::{QrEncoder, QrImage};
use crate::observability::metrics::record_token_issued;

/// Bytes aleatorios por token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Intentos de generación antes de declarar la colisión como fallo del sistema
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Genera un token opaco desde el CSPRNG del sistema operativo,
/// codificado en base64 URL-safe sin padding (43 caracteres).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Resultado de una emisión: registro persistido, URL de validación y QR
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: Token,
    pub validation_url: String,
    pub qr: QrImage,
}

/// Emisor de tokens: genera, persiste con reintentos y codifica el QR
#[derive(Clone)]
pub struct TokenIssuer {
    store: TokenStore,
    encoder: QrEncoder,
    base_url: String,
    max_attempts: u32,
}

impl TokenIssuer {
    pub fn new(store: TokenStore, encoder: QrEncoder, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            store,
            encoder,
            base_url: crate::config::normalize_base_url(&base_url),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// URL canónica embebida en el QR
    pub fn validation_url(&self, token: &str) -> String {
        format!("{}/validate/{}", self.base_url, token)
    }

    /// Persiste un token nuevo, regenerando la cadena ante colisiones
    pub async fn create_token(&self, holder: &Holder) -> Result<Token, TokenError> {
        self.persist_with_retry(holder, |_| Ok(()))
            .await
            .map(|(token, ())| token)
    }

    /// Emite un token completo: cadena + URL + imagen QR, y solo entonces
    /// el registro PENDING. Un fallo al codificar no deja filas huérfanas.
    pub async fn issue(&self, holder: &Holder) -> Result<IssuedToken, TokenError> {
        let (token, (validation_url, qr)) = self
            .persist_with_retry(holder, |value| {
                let validation_url = self.validation_url(value);
                let qr = self
                    .encoder
                    .encode(&validation_url)
                    .map_err(|e| TokenError::QrEncoding(e.to_string()))?;
                Ok((validation_url, qr))
            })
            .await?;

        record_token_issued();
        info!("🎫 Token {} issued for {} {}", token.id, token.holder_name, token.holder_surname);

        Ok(IssuedToken {
            token,
            validation_url,
            qr,
        })
    }

    /// Bucle de emisión: genera la cadena, prepara los artefactos que dependen
    /// de ella y luego inserta. Ante `DuplicateToken` vuelve a empezar.
    async fn persist_with_retry<T, F>(&self, holder: &Holder, prepare: F) -> Result<(Token, T), TokenError>
    where
        F: Fn(&str) -> Result<T, TokenError>,
    {
        for attempt in 1..=self.max_attempts {
            let value = self.store.next_token();
            let prepared = prepare(&value)?;

            match self.store.insert_with_token(&value, holder).await {
                Ok(token) => return Ok((token, prepared)),
                Err(TokenError::DuplicateToken) => {
                    warn!("🔁 Token collision on attempt {}/{}, regenerating", attempt, self.max_attempts);
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        error!(
            "❌ Could not generate a unique token after {} attempts - check RNG health",
            self.max_attempts
        );
        Err(TokenError::GenerationExhausted {
            attempts: self.max_attempts,
        })
    }
}
