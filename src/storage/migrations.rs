//! # Database Migration Management
//!
//! Schema migrations are embedded in the binary from `migrations/` and executed on startup
//! when `auto_migrate` is enabled, or explicitly via `usergate migrate`.

use sqlx::migrate::Migrator;
use tracing::{error, info};

use crate::errors::{Error, Result};
use crate::storage::DbPool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        Error::internal(format!("Database migration failed: {}", e))
    })?;

    info!(version = ?get_migration_version(pool).await?, "Database migrations completed");
    Ok(())
}

/// Latest applied migration version, if any
pub async fn get_migration_version(pool: &DbPool) -> Result<Option<i64>> {
    sqlx::query_scalar::<_, i64>(
        "SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::store(e, "Failed to read migration version"))
}
