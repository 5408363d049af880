//! # Database Connection Pool Management
//!
//! Provides database connection pool creation and management utilities.

use crate::config::DatabaseConfig;
use crate::errors::{Error, Result};
use crate::observability::sanitize_database_url;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{str::FromStr, time::Duration};

/// Type alias for the database connection pool
pub type DbPool = Pool<Sqlite>;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a database connection pool with the specified configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    validate_config(config)?;

    let in_memory = config.is_in_memory();

    let mut connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| {
            Error::store(
                e,
                format!("Invalid SQLite connection string: {}", sanitize_database_url(&config.url)),
            )
        })?
        .create_if_missing(true)
        .busy_timeout(SQLITE_BUSY_TIMEOUT)
        .foreign_keys(true);

    if !in_memory {
        connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        ensure_parent_dir(&connect_options)?;
    }

    // An in-memory database lives only as long as one of its connections, keep one open.
    let min_connections = if in_memory { config.min_connections.max(1) } else { config.min_connections };

    let pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(min_connections)
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true);

    let pool_options = match config.idle_timeout() {
        Some(idle_timeout) if !in_memory => pool_options.idle_timeout(idle_timeout),
        _ => pool_options.idle_timeout(None).max_lifetime(None),
    };

    let pool = pool_options.connect_with(connect_options).await.map_err(|e| {
        tracing::error!(
            error = %e,
            url = %sanitize_database_url(&config.url),
            busy_timeout_ms = SQLITE_BUSY_TIMEOUT.as_millis(),
            "Failed to create SQLite database pool"
        );
        Error::store(
            e,
            format!("Failed to connect to database: {}", sanitize_database_url(&config.url)),
        )
    })?;

    tracing::info!(
        database_type = "sqlite",
        in_memory,
        max_connections = config.max_connections,
        min_connections,
        connect_timeout_ms = config.connect_timeout().as_millis(),
        idle_timeout_ms = config.idle_timeout().map(|d| d.as_millis()),
        "Database connection pool created"
    );

    if config.auto_migrate {
        tracing::info!("Auto-migration enabled, running database migrations");
        crate::storage::migrations::run_migrations(&pool).await?;
    }

    Ok(pool)
}

/// Validate database configuration
fn validate_config(config: &DatabaseConfig) -> Result<()> {
    if config.max_connections == 0 {
        return Err(Error::config("max_connections must be greater than 0"));
    }

    if config.min_connections > config.max_connections {
        return Err(Error::config("min_connections cannot be greater than max_connections"));
    }

    if config.url.is_empty() {
        return Err(Error::config("database URL cannot be empty"));
    }

    if !config.is_sqlite() {
        return Err(Error::config("database URL must start with 'sqlite:'"));
    }

    Ok(())
}

/// Create the directory holding a file-backed database.
fn ensure_parent_dir(options: &SqliteConnectOptions) -> Result<()> {
    let Some(parent) = options.get_filename().parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    std::fs::create_dir_all(parent).map_err(|e| {
        Error::io(e, format!("Failed to create database directory {}", parent.display()))
    })?;
    tracing::info!(path = %parent.display(), "Created database directory");
    Ok(())
}
