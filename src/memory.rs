//! In-memory store backing every repository trait, with the same unique
//! constraints and cascade rules as the PostgreSQL schema. Test-only.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::acronyms::{Acronym, AcronymRepository};
use crate::auth::token::{Token, TokenRepository};
use crate::db::{RepoError, UniqueField};
use crate::users::repo::UserRepository;
use crate::users::repo_types::{Lifecycle, User, Visibility};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tokens: Vec<Token>,
    acronyms: Vec<Acronym>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        // a panicking test thread must not wedge the others
        self.tables.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn seed_acronym(&self, user_id: Uuid, short: &str, long: &str) -> Acronym {
        let acronym = Acronym {
            id: Uuid::new_v4(),
            short: short.into(),
            long: long.into(),
            user_id,
        };
        self.lock().acronyms.push(acronym.clone());
        acronym
    }

    pub fn token_count(&self) -> usize {
        self.lock().tokens.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(
        &self,
        id: Uuid,
        visibility: Visibility,
    ) -> Result<Option<User>, RepoError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.id == id && visibility.admits(&u.lifecycle))
            .cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
        visibility: Visibility,
    ) -> Result<Option<User>, RepoError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username && visibility.admits(&u.lifecycle))
            .cloned())
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<User>, RepoError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| visibility.admits(&u.lifecycle))
            .cloned()
            .collect())
    }

    async fn count_by_username(&self, username: &str) -> Result<i64, RepoError> {
        let n = self
            .lock()
            .users
            .iter()
            .filter(|u| u.username == username)
            .count();
        Ok(n as i64)
    }

    async fn save(&self, user: &User) -> Result<User, RepoError> {
        let mut tables = self.lock();
        let others = tables.users.iter().filter(|u| u.id != user.id);
        for other in others {
            if other.username == user.username {
                return Err(RepoError::Unique(UniqueField::Username));
            }
            if other.email == user.email {
                return Err(RepoError::Unique(UniqueField::Email));
            }
        }
        match tables.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => tables.users.push(user.clone()),
        }
        Ok(user.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.lock();
        match tables
            .users
            .iter_mut()
            .find(|u| u.id == id && u.lifecycle.is_active())
        {
            Some(u) => {
                u.lifecycle = Lifecycle::SoftDeleted {
                    at: OffsetDateTime::now_utc(),
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.lock();
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(u) => {
                u.lifecycle = Lifecycle::Active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hard_delete(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.lock();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.tokens.retain(|t| t.user_id != id);
        tables.acronyms.retain(|a| a.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn insert(&self, token: &Token) -> Result<Token, RepoError> {
        let mut tables = self.lock();
        if !tables.users.iter().any(|u| u.id == token.user_id) {
            return Err(RepoError::Constraint("tokens_user_id_fkey".into()));
        }
        if tables.tokens.iter().any(|t| t.value == token.value) {
            return Err(RepoError::Constraint("tokens_value_key".into()));
        }
        tables.tokens.push(token.clone());
        Ok(token.clone())
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<Token>, RepoError> {
        Ok(self
            .lock()
            .tokens
            .iter()
            .find(|t| t.value == value)
            .cloned())
    }
}

#[async_trait]
impl AcronymRepository for MemoryStore {
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Acronym>, RepoError> {
        Ok(self
            .lock()
            .acronyms
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}
