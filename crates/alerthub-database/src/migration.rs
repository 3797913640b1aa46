//! Schema migrations and schema status.

use serde::Serialize;
use sqlx::PgPool;
use sqlx::migrate::{Migration, Migrator};
use tracing::{debug, info};

use alerthub_core::error::{AppError, AppResult, ErrorKind};

/// Every migration shipped with this build.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// A shipped migration the database has not applied yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingMigration {
    /// Migration version (timestamp prefix of the file).
    pub version: i64,
    /// Human description from the file name.
    pub description: String,
}

/// How the live schema compares with the shipped migrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    /// Versions recorded as successfully applied.
    pub applied: Vec<i64>,
    /// Shipped migrations not yet applied, oldest first.
    pub pending: Vec<PendingMigration>,
}

impl SchemaStatus {
    /// Whether the delivery tables match this build.
    pub fn is_current(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Apply pending migrations and return the resulting status.
pub async fn run_migrations(pool: &PgPool) -> AppResult<SchemaStatus> {
    let before = schema_status(pool).await?;
    if before.is_current() {
        info!(applied = before.applied.len(), "Schema already current");
        return Ok(before);
    }

    info!(pending = before.pending.len(), "Applying migrations");
    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    let after = schema_status(pool).await?;
    info!(applied = after.applied.len(), "Schema migrated");
    Ok(after)
}

/// Compare the `_sqlx_migrations` ledger with the shipped migrations.
///
/// A database that was never migrated reports every migration as pending.
pub async fn schema_status(pool: &PgPool) -> AppResult<SchemaStatus> {
    let ledger_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to inspect schema", e))?;

    let applied: Vec<i64> = if ledger_exists {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
            .fetch_all(pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read migration ledger", e)
            })?
    } else {
        debug!("Migration ledger missing, database never migrated");
        Vec::new()
    };

    let pending = pending_migrations(MIGRATOR.iter(), &applied);
    Ok(SchemaStatus { applied, pending })
}

fn pending_migrations<'a>(
    shipped: impl Iterator<Item = &'a Migration>,
    applied: &[i64],
) -> Vec<PendingMigration> {
    let mut pending: Vec<PendingMigration> = shipped
        .filter(|m| !m.migration_type.is_down_migration())
        .filter(|m| !applied.contains(&m.version))
        .map(|m| PendingMigration {
            version: m.version,
            description: m.description.to_string(),
        })
        .collect();
    pending.sort_by_key(|m| m.version);
    pending
}
