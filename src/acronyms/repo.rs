use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::RepoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Acronym {
    pub id: Uuid,
    pub short: String,
    pub long: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait AcronymRepository: Send + Sync {
    /// All acronyms whose owner is `user_id`, regardless of the owner's deletion state.
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Acronym>, RepoError>;
}

#[derive(Clone)]
pub struct PgAcronymRepository {
    db: PgPool,
}

impl PgAcronymRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AcronymRepository for PgAcronymRepository {
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Acronym>, RepoError> {
        let rows = sqlx::query_as::<_, Acronym>(
            r#"
            SELECT id, short, long, user_id
              FROM acronyms
             WHERE user_id = $1
             ORDER BY short, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
