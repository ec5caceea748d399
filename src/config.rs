//! Application configuration.
//!
//! Loaded once in `main` and handed to the components that need it; nothing
//! reads configuration through globals.

use anyhow::Context;
use chrono::Duration;
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

use crate::auth::{CredentialSecret, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use crate::db::DatabaseConfig;

/// On-disk configuration file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub token_ttl_seconds: Option<i64>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secret: CredentialSecret,
    pub token_ttl: Duration,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Build the configuration.
    ///
    /// `path` is an explicit config file; without one the default locations
    /// are searched and a missing file is not an error. `secret_override`
    /// (usually from `JWT_SECRET`) wins over the file's `jwtSecret`.
    pub fn load(path: Option<&Path>, secret_override: Option<String>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => read_config_file(path)?,
            None => match resolve_config_path() {
                Some(path) => read_config_file(&path)?,
                None => ConfigFile::default(),
            },
        };

        Self::from_file(file, secret_override)
    }

    pub fn from_file(file: ConfigFile, secret_override: Option<String>) -> anyhow::Result<Self> {
        let secret = secret_override
            .filter(|s| !s.is_empty())
            .or(file.jwt_secret)
            .map(|s| expand_env_vars(&s))
            .ok_or_else(|| {
                anyhow::anyhow!("jwtSecret is not configured (set JWT_SECRET or add jwtSecret to the config file)")
            })?;
        if secret.contains("${") {
            anyhow::bail!("jwtSecret references an unset environment variable: {}", secret);
        }
        let secret = CredentialSecret::new(secret).context("invalid jwtSecret")?;

        let ttl_secs = file.token_ttl_seconds.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        if ttl_secs <= 0 {
            anyhow::bail!("tokenTtlSeconds must be positive, got {}", ttl_secs);
        }
        if ttl_secs > MAX_TOKEN_TTL_SECS {
            anyhow::bail!(
                "tokenTtlSeconds must be at most {}, got {}",
                MAX_TOKEN_TTL_SECS,
                ttl_secs
            );
        }
        let token_ttl = Duration::try_seconds(ttl_secs)
            .ok_or_else(|| anyhow::anyhow!("tokenTtlSeconds out of range: {}", ttl_secs))?;

        let database = file.database.map(expand_database).unwrap_or_default();

        Ok(Self {
            secret,
            token_ttl,
            database,
        })
    }
}

/// Locate the config file: `APP_CONFIG`, then
/// `$XDG_CONFIG_HOME/devconnector/config.json`, then `./config/default.json`.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("APP_CONFIG") {
        return Some(PathBuf::from(p));
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let candidate = PathBuf::from(xdg).join("devconnector").join("config.json");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let candidate = PathBuf::from("config").join("default.json");
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
/// Unknown variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Ok(val) = env::var(&name) {
                out.push_str(&val);
            } else {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
        } else {
            out.push(ch);
        }
    }

    out
}

fn expand_database(cfg: DatabaseConfig) -> DatabaseConfig {
    DatabaseConfig {
        url: expand_env_vars(&cfg.url),
        namespace: expand_env_vars(&cfg.namespace),
        database: expand_env_vars(&cfg.database),
        username: cfg.username.map(|u| expand_env_vars(&u)),
        password: cfg.password.map(|p| expand_env_vars(&p)),
    }
}
