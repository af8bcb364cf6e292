use futures_util::future::try_join_all;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    acronyms::Acronym,
    auth::{password::hash_password, token::Token},
    db::RepoError,
    error::AppError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UserWithAcronyms},
        repo_types::{Lifecycle, Role, User, Visibility},
    },
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate(req: &CreateUserRequest) -> Result<(), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if req.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short".into()));
    }
    Ok(())
}

fn require_admin(principal: &User) -> Result<(), AppError> {
    if !principal.is_admin() {
        warn!(user_id = %principal.id, "admin role required");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Creates a user: username pre-check, hash, insert.
///
/// Any authenticated caller may create standard users; only an admin may
/// grant the admin role.
///
/// The pre-check and the insert are separate round trips, so two concurrent
/// creations can both pass the count. The unique constraint then rejects the
/// loser and that rejection is reported exactly like the pre-check.
pub async fn create_user(
    state: &AppState,
    caller: &User,
    mut req: CreateUserRequest,
) -> Result<PublicUser, AppError> {
    if req.role == Some(Role::Admin) {
        require_admin(caller)?;
    }
    req.email = req.email.trim().to_lowercase();
    validate(&req)?;

    if state.users.count_by_username(&req.username).await? > 0 {
        warn!(username = %req.username, "username already exists");
        return Err(AppError::DuplicateUsername);
    }

    let user = User {
        id: Uuid::new_v4(),
        name: req.name,
        username: req.username,
        password_hash: hash_password(&req.password)?,
        email: req.email,
        profile_picture: req.profile_picture,
        role: req.role.unwrap_or_default(),
        lifecycle: Lifecycle::Active,
    };

    let saved = state.users.save(&user).await.map_err(|e| {
        let err = AppError::from(e);
        warn!(username = %user.username, error = %err, "user insert rejected");
        err
    })?;

    info!(
        user_id = %saved.id,
        username = %saved.username,
        role = saved.role.as_str(),
        by = %caller.id,
        "user created"
    );
    Ok(PublicUser::from(&saved))
}

/// Issues and stores a new token for an already authenticated user.
pub async fn login(state: &AppState, principal: &User) -> Result<Token, AppError> {
    let token = Token::generate(principal);
    let saved = state.tokens.insert(&token).await?;
    info!(user_id = %principal.id, token_id = %saved.id, "user logged in");
    Ok(saved)
}

/// Admin only. The role check runs before the target is looked up so that
/// non-admins learn nothing about which ids exist. An admin cannot delete
/// their own account: restore needs an admin and the bootstrap skips an
/// existing row, so the last admin would be locked out for good.
pub async fn soft_delete_user(
    state: &AppState,
    principal: &User,
    target: Uuid,
) -> Result<(), AppError> {
    require_admin(principal)?;
    if principal.id == target {
        warn!(user_id = %target, "admin attempted to delete own account");
        return Err(AppError::Forbidden);
    }

    if state
        .users
        .find_by_id(target, Visibility::ActiveOnly)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    if !state.users.soft_delete(target).await? {
        return Err(AppError::NotFound);
    }

    info!(user_id = %target, by = %principal.id, "user soft-deleted");
    Ok(())
}

/// Admin only, same ordering as [`soft_delete_user`]. Restoring an active
/// user is a successful no-op.
pub async fn restore_user(
    state: &AppState,
    principal: &User,
    target: Uuid,
) -> Result<(), AppError> {
    require_admin(principal)?;

    let user = state
        .users
        .find_by_id(target, Visibility::IncludingDeleted)
        .await?
        .ok_or(AppError::NotFound)?;

    if user.lifecycle.is_active() {
        debug!(user_id = %target, "restore of active user; nothing to do");
        return Ok(());
    }
    if !state.users.restore(target).await? {
        return Err(AppError::NotFound);
    }

    info!(user_id = %target, by = %principal.id, "user restored");
    Ok(())
}

/// Permanently removes the user, soft-deleted or not. Missing ids are 404.
pub async fn force_delete_user(
    state: &AppState,
    principal: &User,
    target: Uuid,
) -> Result<(), AppError> {
    if state
        .users
        .find_by_id(target, Visibility::IncludingDeleted)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    if !state.users.hard_delete(target).await? {
        return Err(AppError::NotFound);
    }

    info!(user_id = %target, by = %principal.id, "user purged");
    Ok(())
}

pub async fn list_users(state: &AppState) -> Result<Vec<PublicUser>, AppError> {
    let users = state.users.list(Visibility::ActiveOnly).await?;
    Ok(users.iter().map(PublicUser::from).collect())
}

pub async fn get_user(state: &AppState, id: Uuid) -> Result<PublicUser, AppError> {
    state
        .users
        .find_by_id(id, Visibility::ActiveOnly)
        .await?
        .map(|u| PublicUser::from(&u))
        .ok_or(AppError::NotFound)
}

/// Acronyms owned by `id`. The owner may be soft-deleted; only a missing row is 404.
pub async fn user_acronyms(state: &AppState, id: Uuid) -> Result<Vec<Acronym>, AppError> {
    if state
        .users
        .find_by_id(id, Visibility::IncludingDeleted)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    Ok(state.acronyms.list_by_owner(id).await?)
}

/// Every active user with their acronyms. The per-user queries run
/// concurrently and are zipped back by position.
pub async fn list_users_with_acronyms(state: &AppState) -> Result<Vec<UserWithAcronyms>, AppError> {
    let users = state.users.list(Visibility::ActiveOnly).await?;
    let acronyms = try_join_all(users.iter().map(|u| state.acronyms.list_by_owner(u.id))).await?;

    Ok(users
        .into_iter()
        .zip(acronyms)
        .map(|(u, acronyms)| UserWithAcronyms {
            id: u.id,
            name: u.name,
            username: u.username,
            acronyms,
        })
        .collect())
}

/// Seeds the configured admin account unless a user with that username
/// already exists, deleted or not. Returns whether a user was created.
pub async fn bootstrap_admin(state: &AppState) -> Result<bool, AppError> {
    let admin = &state.config.admin;
    if state
        .users
        .find_by_username(&admin.username, Visibility::IncludingDeleted)
        .await?
        .is_some()
    {
        debug!(username = %admin.username, "admin account present");
        return Ok(false);
    }

    let user = User {
        id: Uuid::new_v4(),
        name: admin.name.clone(),
        username: admin.username.clone(),
        password_hash: hash_password(&admin.password)?,
        email: admin.email.clone(),
        profile_picture: None,
        role: Role::Admin,
        lifecycle: Lifecycle::Active,
    };

    match state.users.save(&user).await {
        Ok(saved) => {
            info!(user_id = %saved.id, username = %saved.username, "admin account created");
            Ok(true)
        }
        Err(RepoError::Unique(_)) => {
            info!(username = %admin.username, "admin account created concurrently");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
