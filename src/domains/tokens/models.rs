//! Modelos del ciclo de vida de los tokens de un solo uso

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;

// ======================================================================
// ESTADO
// ======================================================================

/// Estado de un token. Solo existe la transición PENDING → USED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenStatus {
    Pending,
    Used,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Pending => "PENDING",
            TokenStatus::Used => "USED",
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Estado de token desconocido: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TokenStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TokenStatus::Pending),
            "USED" => Ok(TokenStatus::Used),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ======================================================================
// TOKEN
// ======================================================================

/// Datos del titular capturados al emitir el token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub name: String,
    pub surname: String,
    pub id_number: String,
}

impl Holder {
    pub fn new(name: impl Into<String>, surname: impl Into<String>, id_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            id_number: id_number.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    pub token: String,
    pub holder_name: String,
    pub holder_surname: String,
    pub holder_id_number: String,
    pub status: TokenStatus,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn is_used(&self) -> bool {
        self.status == TokenStatus::Used
    }

    pub fn holder(&self) -> Holder {
        Holder::new(&self.holder_name, &self.holder_surname, &self.holder_id_number)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Token {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<TokenStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Token {
            id: row.try_get("id")?,
            token: row.try_get("token")?,
            holder_name: row.try_get("holder_name")?,
            holder_surname: row.try_get("holder_surname")?,
            holder_id_number: row.try_get("holder_id_number")?,
            status,
            created_at: row.try_get("created_at")?,
            used_at: row.try_get("used_at")?,
        })
    }
}

/// Totales por estado para el panel de administración
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenCounts {
    pub pending: i64,
    pub used: i64,
}

impl TokenCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.used
    }
}

// ======================================================================
// ERRORES
// ======================================================================

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token no encontrado")]
    NotFound,

    #[error("Token ya utilizado")]
    AlreadyUsed,

    #[error("Token duplicado")]
    DuplicateToken,

    #[error("No se pudo generar un token único tras {attempts} intentos")]
    GenerationExhausted { attempts: u32 },

    #[error("Error al generar QR: {0}")]
    QrEncoding(String),

    #[error("Error de base de datos: {0}")]
    Database(#[from] sqlx::Error),
}
