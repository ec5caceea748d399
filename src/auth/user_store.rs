//! Credential record storage.

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::db::Db;
use crate::db::schema::{UserCreate, UserRecord};
use crate::types::{Email, UserId};

/// Input for registering a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
}

/// Result of [`UserStore::create_user`].
#[derive(Debug)]
pub enum CreateOutcome {
    Created(UserRecord),
    /// Another record already holds this email.
    EmailTaken,
}

/// Whether `err` is a violation of the unique `user_email` index.
fn is_email_conflict(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("user_email") && msg.contains("already contains")
}

/// Gravatar URL for `email`: 200px, PG rated, "mystery man" fallback.
pub fn gravatar_url(email: &Email) -> String {
    let digest = Sha256::digest(email.as_str().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm",
        digest
    )
}

/// User store for database operations.
pub struct UserStore {
    db: Db,
}

impl UserStore {
    /// Create a new user store.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a user, assigning a fresh identity and registration date.
    ///
    /// The unique email index is the final arbiter: a concurrent insert of
    /// the same email yields [`CreateOutcome::EmailTaken`], not an error.
    pub async fn create_user(&self, new_user: NewUser) -> Result<CreateOutcome> {
        let create = UserCreate {
            uid: UserId::new(Uuid::new_v4().simple().to_string()),
            avatar: gravatar_url(&new_user.email),
            name: new_user.name,
            email: new_user.email,
            password: new_user.password_hash,
            date: chrono::Utc::now().to_rfc3339(),
        };

        let query = r#"
            CREATE user CONTENT {
                uid: $uid,
                name: $name,
                email: $email,
                avatar: $avatar,
                password: $password,
                date: $date
            }
        "#;

        let result = self
            .db
            .query(query)
            .bind(("uid", create.uid.into_inner()))
            .bind(("name", create.name))
            .bind(("email", create.email.into_inner()))
            .bind(("avatar", create.avatar))
            .bind(("password", create.password))
            .bind(("date", create.date))
            .await
            .and_then(|mut res| res.take::<Vec<UserRecord>>(0));

        let users = match result {
            Ok(users) => users,
            Err(err) if is_email_conflict(&err) => {
                info!("Registration rejected by unique email index");
                return Ok(CreateOutcome::EmailTaken);
            }
            Err(err) => return Err(err.into()),
        };

        let user = users
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))?;

        info!(user_id = %user.uid, "Registered new user");
        Ok(CreateOutcome::Created(user))
    }

    /// Find a user by login email. The email must already be normalized.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>> {
        let query = "SELECT * FROM user WHERE email = $email LIMIT 1";

        let mut res = self
            .db
            .query(query)
            .bind(("email", email.as_str().to_string()))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Get a user by identity.
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>> {
        let query = "SELECT * FROM user WHERE uid = $uid LIMIT 1";

        let mut res = self
            .db
            .query(query)
            .bind(("uid", user_id.as_str().to_string()))
            .await?;

        let users: Vec<UserRecord> = res.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Delete a user. Returns whether a record was removed.
    pub async fn delete_user(&self, user_id: &UserId) -> Result<bool> {
        let query = "DELETE user WHERE uid = $uid RETURN BEFORE";

        let mut res = self
            .db
            .query(query)
            .bind(("uid", user_id.as_str().to_string()))
            .await?;

        let deleted: Vec<UserRecord> = res.take(0)?;
        if !deleted.is_empty() {
            info!(user_id = %user_id, "Deleted user");
        }
        Ok(!deleted.is_empty())
    }
}
