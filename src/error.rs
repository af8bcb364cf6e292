use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::db::{RepoError, UniqueField};

/// Failures surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Admin role required")]
    Forbidden,
    #[error("User not found")]
    NotFound,
    #[error("Username already exists")]
    DuplicateUsername,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("{0}")]
    Validation(String),
    /// Password hashing failed; the operation is aborted before any write.
    #[error("hashing failed: {0}")]
    Fatal(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateUsername
            | AppError::DuplicateEmail
            | AppError::ConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Fatal(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            // a late unique violation is the same outcome as the early pre-check
            RepoError::Unique(UniqueField::Username) => AppError::DuplicateUsername,
            RepoError::Unique(UniqueField::Email) => AppError::DuplicateEmail,
            RepoError::Constraint(name) => AppError::ConstraintViolation(name),
            RepoError::Backend(msg) => AppError::Storage(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Fatal(_) | AppError::Storage(_) => {
                error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DuplicateUsername.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Fatal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn late_unique_violations_classify_like_precheck() {
        assert!(matches!(
            AppError::from(RepoError::Unique(UniqueField::Username)),
            AppError::DuplicateUsername
        ));
        assert!(matches!(
            AppError::from(RepoError::Unique(UniqueField::Email)),
            AppError::DuplicateEmail
        ));
        assert!(matches!(
            AppError::from(RepoError::Constraint("tokens_user_id_fkey".into())),
            AppError::ConstraintViolation(_)
        ));
    }

    #[tokio::test]
    async fn internal_details_are_not_returned() {
        let res = AppError::Storage("connection refused on 10.0.0.1".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Internal server error");
    }
}
