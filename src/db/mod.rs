use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

/// Esquema del único registro persistido. El CHECK mantiene `used_at`
/// presente si y solo si el estado es USED.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tokens (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    token             TEXT    NOT NULL UNIQUE,
    holder_name       TEXT    NOT NULL,
    holder_surname    TEXT    NOT NULL,
    holder_id_number  TEXT    NOT NULL,
    status            TEXT    NOT NULL DEFAULT 'PENDING'
                              CHECK (status IN ('PENDING', 'USED')),
    created_at        TEXT    NOT NULL,
    used_at           TEXT,
    CHECK ((status = 'USED') = (used_at IS NOT NULL))
);
CREATE INDEX IF NOT EXISTS idx_tokens_created_at ON tokens (created_at DESC);
"#;

/// Crea el pool de SQLite. Las bases en memoria se mantienen vivas
/// deshabilitando el reciclado de conexiones.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");

    info!("🔌 Connecting to token store at {}", config.url);

    let mut options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds));
    if in_memory {
        pool_options = pool_options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;

    info!("✅ Token store pool created successfully");
    Ok(pool)
}

/// Crea la tabla de tokens si no existe
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("📋 Token schema ready");
    Ok(())
}

/// Verifica la salud de la conexión
pub async fn check_health(pool: &SqlitePool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}
