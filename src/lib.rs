mod config;
pub mod api;
pub mod auth;
pub mod db;
pub mod types;

pub use config::{AppConfig, ConfigFile, resolve_config_path};
pub use db::{DatabaseConfig, create_connection, ensure_schema};
pub use types::{AccessToken, Email, UserId};

use std::sync::Arc;

use anyhow::Result;
use auth::{AccessGuard, Clock, CredentialIssuer, SystemClock, UserStore};

/// Connect to the database, make sure the schema exists and assemble the
/// shared state for the HTTP API.
pub async fn create_app_state(config: &AppConfig) -> Result<api::AppState> {
    let db = create_connection(config.database.clone()).await?;
    ensure_schema(&db).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let issuer = CredentialIssuer::new(config.secret.clone(), config.token_ttl, clock.clone());
    let guard = AccessGuard::new(config.secret.clone(), clock);

    Ok(api::AppState {
        users: Arc::new(UserStore::new(db)),
        issuer: Arc::new(issuer),
        guard: Arc::new(guard),
    })
}
