//! Embedded schema migrations from the workspace `migrations/` directory.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use dochub_core::error::{AppError, ErrorKind};
use dochub_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// One embedded migration and whether the database has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Apply every pending migration. Returns how many were applied.
pub async fn run_migrations(pool: &PgPool) -> AppResult<usize> {
    let before = applied_versions(pool).await?;
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Migration failed", e))?;

    let applied = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration() && !before.contains(&m.version))
        .count();
    info!(applied, "Schema is up to date");
    Ok(applied)
}

/// Every embedded migration, oldest first, with its applied flag.
pub async fn migration_status(pool: &PgPool) -> AppResult<Vec<MigrationStatus>> {
    let applied = applied_versions(pool).await?;
    Ok(MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}

async fn applied_versions(pool: &PgPool) -> AppResult<HashSet<i64>> {
    let exists: bool = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to inspect schema", e))?;
    if !exists {
        return Ok(HashSet::new());
    }

    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read migration history", e)
            })?;
    Ok(versions.into_iter().collect())
}
