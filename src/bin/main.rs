use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use devconnector::auth::{AccessGuard, Clock, CredentialIssuer, SystemClock};
use devconnector::{AppConfig, UserId, create_app_state};

#[derive(Parser)]
#[command(name = "devconnector")]
#[command(about = "Social profile API: registration, login and token-guarded routes")]
struct Cli {
    /// Path to the JSON config file (defaults: $XDG_CONFIG_HOME/devconnector/config.json, ./config/default.json)
    #[arg(long, global = true, env = "APP_CONFIG")]
    config: Option<PathBuf>,
    /// Token signing secret, overrides `jwtSecret` from the config file
    #[arg(long, global = true, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
    /// Database URL, overrides the config file
    #[arg(long, global = true, env = "SURREALDB_URL")]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    Server {
        #[arg(short, long, default_value = "0.0.0.0:5000")]
        bind: String,
    },
    /// Initialize the database schema
    Init,
    /// Issue an access token for a user ID
    IssueToken { user_id: String },
    /// Verify an access token and print the user ID it carries
    VerifyToken { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("devconnector=info".parse()?)
                .add_directive("surrealdb=warn".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref(), cli.jwt_secret)?;
    if let Some(url) = cli.db_url {
        config.database.url = url;
    }

    match cli.command {
        Commands::Server { bind } => {
            info!("Using database url for REST server: {}", config.database.url);
            info!(
                "Access tokens expire after {} seconds",
                config.token_ttl.num_seconds()
            );

            let state = create_app_state(&config).await?;
            let app = devconnector::api::create_router(state);

            let listener = tokio::net::TcpListener::bind(&bind).await?;
            info!("Server listening on http://{}", bind);

            axum::serve(listener, app).await?;
        }
        Commands::Init => {
            info!("Using database url for initialization: {}", config.database.url);

            info!("Initializing database...");
            let db = devconnector::create_connection(config.database).await?;
            devconnector::ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::IssueToken { user_id } => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let issuer = CredentialIssuer::new(config.secret, config.token_ttl, clock);
            let token = issuer.issue(&UserId::new(user_id))?;

            println!("{}", token);
        }
        Commands::VerifyToken { token } => {
            let guard = AccessGuard::new(config.secret, Arc::new(SystemClock));
            match guard.verify(&token) {
                Ok(user) => {
                    let expires = chrono::DateTime::from_timestamp(user.expires_at(), 0)
                        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_else(|| user.expires_at().to_string());
                    println!("  User:    {}", user.id());
                    println!("  Expires: {}", expires);
                }
                Err(e) => {
                    println!("{}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
