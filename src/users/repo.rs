use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::RepoError;
use crate::users::repo_types::{User, UserRow, Visibility};

const USER_COLUMNS: &str =
    "id, name, username, password_hash, email, profile_picture, role, deleted_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid, visibility: Visibility)
        -> Result<Option<User>, RepoError>;

    async fn find_by_username(
        &self,
        username: &str,
        visibility: Visibility,
    ) -> Result<Option<User>, RepoError>;

    /// Users in creation order.
    async fn list(&self, visibility: Visibility) -> Result<Vec<User>, RepoError>;

    /// Counts every row with this username, soft-deleted ones included.
    async fn count_by_username(&self, username: &str) -> Result<i64, RepoError>;

    /// Insert or update by id.
    async fn save(&self, user: &User) -> Result<User, RepoError>;

    /// Stamps `deleted_at` on an active row. Returns whether a row changed.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Clears `deleted_at`. Returns whether the row exists.
    async fn restore(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Removes the row for good, freeing its username and email.
    async fn hard_delete(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn include_deleted(visibility: Visibility) -> bool {
    visibility == Visibility::IncludingDeleted
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND ($2 OR deleted_at IS NULL)"
        ))
        .bind(id)
        .bind(include_deleted(visibility))
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
        visibility: Visibility,
    ) -> Result<Option<User>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND ($2 OR deleted_at IS NULL)"
        ))
        .bind(username)
        .bind(include_deleted(visibility))
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>, RepoError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1 OR deleted_at IS NULL) ORDER BY created_at, id"
        ))
        .bind(include_deleted(visibility))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn count_by_username(&self, username: &str) -> Result<i64, RepoError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn save(&self, user: &User) -> Result<User, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, username, password_hash, email, profile_picture, role, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                username = EXCLUDED.username,
                password_hash = EXCLUDED.password_hash,
                email = EXCLUDED.email,
                profile_picture = EXCLUDED.profile_picture,
                role = EXCLUDED.role,
                deleted_at = EXCLUDED.deleted_at
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.profile_picture)
        .bind(user.role.as_str())
        .bind(user.lifecycle.deleted_at())
        .fetch_one(&self.db)
        .await?;
        User::try_from(row)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let res =
            sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.db)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn restore(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("UPDATE users SET deleted_at = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
