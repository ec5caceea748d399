use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::types::{Email, UserId};

/// Persisted credential record (table: `user`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Database identifier
    pub id: RecordId,
    /// Public identity carried in access tokens
    pub uid: UserId,
    /// Display name
    pub name: String,
    /// Normalized login email, unique across users
    pub email: Email,
    /// Gravatar URL derived from the email
    pub avatar: String,
    /// argon2 PHC hash of the password
    pub password: String,
    /// Registration time (RFC 3339)
    pub date: String,
}

/// Payload used when inserting a new user into the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub uid: UserId,
    pub name: String,
    pub email: Email,
    pub avatar: String,
    pub password: String,
    pub date: String,
}

/// Public view of a user, safe to return from the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub avatar: String,
    pub date: String,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.uid,
            name: record.name,
            email: record.email,
            avatar: record.avatar,
            date: record.date,
        }
    }
}
