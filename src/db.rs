use anyhow::Context;
use sqlx::{error::ErrorKind, postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

/// Column guarded by a unique constraint on `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("unique constraint violated on {0:?}")]
    Unique(UniqueField),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("database error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => return classify_unique(&constraint),
                ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => return RepoError::Constraint(constraint),
                _ => {}
            }
        }
        RepoError::Backend(e.to_string())
    }
}

/// Maps a violated constraint name to the column it protects.
pub fn classify_unique(constraint: &str) -> RepoError {
    if constraint.contains("username") {
        RepoError::Unique(UniqueField::Username)
    } else if constraint.contains("email") {
        RepoError::Unique(UniqueField::Email)
    } else {
        RepoError::Constraint(constraint.to_string())
    }
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}
