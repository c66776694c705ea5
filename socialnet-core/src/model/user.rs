//! User records and profile updates

use super::types::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered user as persisted in the relational store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// PHC-formatted Argon2 digest of the password
    pub hashed_password: String,

    /// Salt the digest was computed with
    pub salt: String,

    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,

    /// Unique login name, also used as the display name
    pub username: String,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            user_id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Fields required to insert a user; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub hashed_password: String,
    pub salt: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub username: String,
}

/// Identifier plus display name, as returned by graph queries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: String,
}
