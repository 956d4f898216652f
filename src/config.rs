//! Configuración del servicio leída desde variables de entorno

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub qr: QrSettings,
    /// Token bearer requerido por /admin. `None` deja el listado abierto.
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// URL pública usada para construir el enlace de validación del QR.
    /// Debe ser alcanzable desde el dispositivo que escanea, no solo localhost.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrSettings {
    pub module_px: u32,
    pub max_issue_attempts: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://qr_tokens.db?mode=rwc".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                acquire_timeout_seconds: env::var("DATABASE_ACQUIRE_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()?,
                base_url: normalize_base_url(
                    &env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string()),
                ),
            },
            qr: QrSettings {
                module_px: env::var("QR_MODULE_PX")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                max_issue_attempts: 5,
            },
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        })
    }

    /// Configuración para tests: SQLite en memoria y base URL fija
    pub fn for_tests(base_url: &str) -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
                acquire_timeout_seconds: 5,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: normalize_base_url(base_url),
            },
            qr: QrSettings {
                module_px: 10,
                max_issue_attempts: 5,
            },
            admin_token: None,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Elimina las barras finales para que `{base}/validate/{token}` no duplique `/`
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
