use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::domains::qr::{QrEncoder, QrEncoderConfig};
use crate::domains::tokens::{TokenIssuer, TokenStore};

/// Estado compartido de la aplicación.
/// Contiene el almacén de tokens, el emisor y la configuración.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: TokenStore,
    pub issuer: TokenIssuer,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = db::create_pool(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open token store: {}", e))?;
        db::init_schema(&pool).await?;

        if config.admin_token.is_none() {
            warn!("⚠️ ADMIN_TOKEN not set - /admin listing is publicly accessible");
        }
        info!("🌐 Validation links will use base URL {}", config.server.base_url);

        Ok(Self::from_pool(config, pool))
    }

    /// Construye el estado sobre un pool ya inicializado
    pub fn from_pool(config: Config, pool: SqlitePool) -> Self {
        let store = TokenStore::new(pool);
        let encoder = QrEncoder::new(QrEncoderConfig {
            module_px: config.qr.module_px,
            quiet_zone: true,
        });
        let issuer = TokenIssuer::new(store.clone(), encoder, config.server.base_url.clone())
            .with_max_attempts(config.qr.max_issue_attempts);

        Self {
            config: Arc::new(config),
            store,
            issuer,
        }
    }
}
