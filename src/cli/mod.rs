//! # Command Line Interface
//!
//! `usergate [--config FILE] [serve|migrate|check-config]`. Without a subcommand the API
//! server is started.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::{start_api_server, ApiState};
use crate::auth::{AccountService, SessionCookieSettings, TokenCodec};
use crate::config::AppConfig;
use crate::observability::{init_logging, log_config_info};
use crate::storage::{create_pool, get_migration_version, run_migrations};
use crate::{Result, APP_NAME, VERSION};

#[derive(Debug, Parser)]
#[command(name = "usergate")]
#[command(about = "Account registration, login and profile service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional TOML configuration file, layered under environment variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Load and validate configuration, then exit
    CheckConfig,
}

/// Run the parsed command line.
pub async fn run_cli(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.observability)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => migrate(config).await,
        Commands::CheckConfig => {
            log_config_info(&config);
            println!("Configuration is valid");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!(app_name = APP_NAME, version = VERSION, "Starting usergate");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    let codec = Arc::new(TokenCodec::new(config.auth.jwt_secret.as_bytes())?);
    let accounts = Arc::new(AccountService::with_sqlx(pool.clone(), codec));
    let cookies = SessionCookieSettings::from_config(&config.auth);

    start_api_server(&config, ApiState::new(accounts, cookies, pool)).await
}

async fn migrate(mut config: AppConfig) -> Result<()> {
    config.database.auto_migrate = false;
    let pool = create_pool(&config.database).await?;

    run_migrations(&pool).await?;

    let version = get_migration_version(&pool).await?;
    info!(version = ?version, "Migrations applied");
    println!("Migrations completed successfully (version {})", version.unwrap_or_default());
    Ok(())
}
