//! Wire DTOs shared between the gateway, the session and the endpoint catalog.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, as persisted under the `user` storage key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Body returned by `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl LoginResponse {
    /// Value sent back in the `Authorization` header: `"{token_type} {access_token}"`.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    #[must_use]
    pub fn user(&self) -> User {
        User { id: self.user_id, username: self.username.clone(), is_admin: self.is_admin }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
