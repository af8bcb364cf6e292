use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::db::RepoError;
use crate::users::repo_types::User;

const TOKEN_BYTES: usize = 16;

/// Opaque bearer credential bound to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Uuid,
    pub value: String,
}

impl Token {
    /// Builds a fresh token for `user`. Nothing is persisted.
    pub fn generate(user: &User) -> Token {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = Token {
            id: Uuid::new_v4(),
            user_id: user.id,
            value: Base64::encode_string(&bytes),
        };
        debug!(user_id = %user.id, token_id = %token.id, "token generated");
        token
    }
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, token: &Token) -> Result<Token, RepoError>;
    async fn find_by_value(&self, value: &str) -> Result<Option<Token>, RepoError>;
}

#[derive(Clone)]
pub struct PgTokenRepository {
    db: PgPool,
}

impl PgTokenRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn insert(&self, token: &Token) -> Result<Token, RepoError> {
        let saved = sqlx::query_as::<_, Token>(
            r#"
            INSERT INTO tokens (id, user_id, value)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, value
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.value)
        .fetch_one(&self.db)
        .await?;
        Ok(saved)
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<Token>, RepoError> {
        let token = sqlx::query_as::<_, Token>(
            r#"SELECT id, user_id, value FROM tokens WHERE value = $1"#,
        )
        .bind(value)
        .fetch_optional(&self.db)
        .await?;
        Ok(token)
    }
}
