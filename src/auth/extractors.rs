use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64ct::{Base64, Encoding};
use tracing::{debug, warn};

use super::password::verify_password;
use crate::{
    error::AppError,
    state::AppState,
    users::repo_types::{User, Visibility},
};

/// One way of resolving the caller from request headers.
///
/// `Ok(None)` means the request carries no credentials of this kind; the
/// [`Principal`] guard decides whether that is acceptable. Credentials that
/// are present but wrong are rejected outright.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        headers: &HeaderMap,
        state: &AppState,
    ) -> Result<Option<User>, AppError>;
}

/// `Authorization: Basic base64(username:password)`, used only for login.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicAuth;

/// `Authorization: Bearer <token>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerAuth;

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let (given, rest) = header.split_once(' ')?;
    given.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}

/// Splits a Basic credential payload into username and password.
pub(crate) fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let raw = Base64::decode_vec(encoded).ok()?;
    let text = String::from_utf8(raw).ok()?;
    let (username, password) = text.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[async_trait]
impl Authenticator for BasicAuth {
    async fn authenticate(
        &self,
        headers: &HeaderMap,
        state: &AppState,
    ) -> Result<Option<User>, AppError> {
        let Some(encoded) = authorization(headers).and_then(|h| strip_scheme(h, "Basic")) else {
            return Ok(None);
        };
        let (username, password) = decode_basic(encoded).ok_or_else(|| {
            warn!("malformed basic credentials");
            AppError::Unauthorized
        })?;

        let user = state
            .users
            .find_by_username(&username, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| {
                warn!(%username, "basic auth for unknown or deleted user");
                AppError::Unauthorized
            })?;

        if !verify_password(&password, &user.password_hash) {
            warn!(%username, user_id = %user.id, "basic auth invalid password");
            return Err(AppError::Unauthorized);
        }

        debug!(user_id = %user.id, "basic auth ok");
        Ok(Some(user))
    }
}

#[async_trait]
impl Authenticator for BearerAuth {
    async fn authenticate(
        &self,
        headers: &HeaderMap,
        state: &AppState,
    ) -> Result<Option<User>, AppError> {
        let Some(value) = authorization(headers).and_then(|h| strip_scheme(h, "Bearer")) else {
            return Ok(None);
        };

        let token = state.tokens.find_by_value(value).await?.ok_or_else(|| {
            warn!("unknown bearer token");
            AppError::Unauthorized
        })?;

        let user = state
            .users
            .find_by_id(token.user_id, Visibility::ActiveOnly)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %token.user_id, "bearer token owner is not active");
                AppError::Unauthorized
            })?;

        debug!(user_id = %user.id, token_id = %token.id, "token auth ok");
        Ok(Some(user))
    }
}

/// Middleware stage: runs `A` and attaches the resolved user, if any.
pub async fn authenticate<A>(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError>
where
    A: Authenticator + Default,
{
    let user = A::default().authenticate(req.headers(), &state).await?;
    if let Some(user) = user {
        req.extensions_mut().insert(Principal(user));
    }
    Ok(next.run(req).await)
}

/// The authenticated caller. Extracting it is the guard: a route whose
/// pipeline attached no principal is rejected with 401.
#[derive(Debug, Clone)]
pub struct Principal(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            warn!(path = %parts.uri.path(), "no authenticated principal");
            AppError::Unauthorized
        })
    }
}
