use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, warn};

use super::issuer::generate_token;
use super::models::{Holder, Token, TokenCounts, TokenError};

const TOKEN_COLUMNS: &str =
    "id, token, holder_name, holder_surname, holder_id_number, status, created_at, used_at";

/// Fuente de cadenas de token usada por `TokenStore::create`
pub type TokenGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Acceso persistente a los tokens emitidos.
///
/// Es el único recurso mutable compartido del servicio; se construye una vez
/// en el arranque y se inyecta a los handlers a través de `AppState`.
#[derive(Clone)]
pub struct TokenStore {
    db: SqlitePool,
    generator: TokenGenerator,
}

impl TokenStore {
    pub fn new(db: SqlitePool) -> Self {
        Self::with_generator(db, Arc::new(generate_token))
    }

    pub fn with_generator(db: SqlitePool, generator: TokenGenerator) -> Self {
        Self { db, generator }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Siguiente cadena candidata, todavía sin persistir
    pub fn next_token(&self) -> String {
        (self.generator)()
    }

    /// Genera una cadena nueva y persiste un registro PENDING.
    /// Devuelve `DuplicateToken` si la cadena ya existe; el llamador reintenta.
    pub async fn create(&self, holder: &Holder) -> Result<Token, TokenError> {
        let token = self.next_token();
        self.insert_with_token(&token, holder).await
    }

    pub async fn insert_with_token(&self, token: &str, holder: &Holder) -> Result<Token, TokenError> {
        let query = format!(
            r#"
            INSERT INTO tokens (token, holder_name, holder_surname, holder_id_number, status, created_at)
            VALUES (?, ?, ?, ?, 'PENDING', ?)
            RETURNING {}
            "#,
            TOKEN_COLUMNS
        );

        let res = sqlx::query_as::<_, Token>(&query)
            .bind(token)
            .bind(&holder.name)
            .bind(&holder.surname)
            .bind(&holder.id_number)
            .bind(Utc::now())
            .fetch_one(&self.db)
            .await;

        match res {
            Ok(created) => {
                debug!("Token {} created for holder {}", created.id, created.holder_id_number);
                Ok(created)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!("Unique violation inserting token (collision)");
                Err(TokenError::DuplicateToken)
            }
            Err(e) => Err(TokenError::Database(e)),
        }
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Token, TokenError> {
        let query = format!("SELECT {} FROM tokens WHERE token = ?", TOKEN_COLUMNS);

        sqlx::query_as::<_, Token>(&query)
            .bind(token)
            .fetch_optional(&self.db)
            .await?
            .ok_or(TokenError::NotFound)
    }

    /// Transición PENDING → USED en una sola sentencia condicional.
    ///
    /// El `WHERE status = 'PENDING'` hace que, entre validaciones concurrentes
    /// del mismo token, solo una vea `rows_affected() == 1`. Las demás
    /// reciben `AlreadyUsed`; un token inexistente da `NotFound`.
    pub async fn mark_used(&self, token: &str) -> Result<Token, TokenError> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET status = 'USED', used_at = ?
            WHERE token = ? AND status = 'PENDING'
            "#,
        )
        .bind(Utc::now())
        .bind(token)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 1 {
            return self.find_by_token(token).await;
        }

        // Sin filas afectadas: el token no existe o ya estaba usado
        match self.find_by_token(token).await {
            Ok(_) => Err(TokenError::AlreadyUsed),
            Err(e) => Err(e),
        }
    }

    /// Todos los tokens, más recientes primero
    pub async fn list_all(&self) -> Result<Vec<Token>, TokenError> {
        let query = format!(
            "SELECT {} FROM tokens ORDER BY created_at DESC, id DESC",
            TOKEN_COLUMNS
        );

        let tokens = sqlx::query_as::<_, Token>(&query).fetch_all(&self.db).await?;
        Ok(tokens)
    }

    pub async fn count_by_status(&self) -> Result<TokenCounts, TokenError> {
        let (pending, used): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN status = 'PENDING' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'USED' THEN 1 ELSE 0 END), 0)
            FROM tokens
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(TokenCounts { pending, used })
    }
}
