use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "devconnector".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "app".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = [
        // Credential records
        "DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;
         DEFINE FIELD IF NOT EXISTS uid ON TABLE user TYPE string;
         DEFINE FIELD IF NOT EXISTS name ON TABLE user TYPE string;
         DEFINE FIELD IF NOT EXISTS email ON TABLE user TYPE string;
         DEFINE FIELD IF NOT EXISTS avatar ON TABLE user TYPE string;
         DEFINE FIELD IF NOT EXISTS password ON TABLE user TYPE string;
         DEFINE FIELD IF NOT EXISTS date ON TABLE user TYPE string;",
        // Lookups by identity and by login email
        "DEFINE INDEX IF NOT EXISTS user_uid ON TABLE user COLUMNS uid UNIQUE;
         DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email UNIQUE;",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}
