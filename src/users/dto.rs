use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::acronyms::Acronym;
use crate::users::repo_types::{Role, User};

/// Request body for user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub username: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            username: u.username.clone(),
        }
    }
}

/// A user together with the acronyms they own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithAcronyms {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub acronyms: Vec<Acronym>,
}
