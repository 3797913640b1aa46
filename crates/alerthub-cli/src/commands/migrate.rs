//! Schema migration commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use alerthub_core::error::AppError;
use alerthub_database::DatabasePool;
use alerthub_database::migration::{SchemaStatus, run_migrations, schema_status};

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply pending migrations
    Run,
    /// List migrations the database has not applied
    Status,
    /// Report connectivity, pool usage and schema state
    Check,
}

/// Pending migration row for table output
#[derive(Debug, Serialize, Tabled)]
struct PendingRow {
    /// Version
    version: i64,
    /// Description
    description: String,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let db = DatabasePool::connect(&config.database).await?;
    let result = run(&db, &args.command, format).await;
    db.close().await;
    result
}

async fn run(db: &DatabasePool, command: &MigrateCommand, format: OutputFormat) -> Result<(), AppError> {
    match command {
        MigrateCommand::Run => {
            let status = run_migrations(db.pool()).await?;
            output::print_success(&format!(
                "Schema current with {} migration(s) applied.",
                status.applied.len()
            ));
        }
        MigrateCommand::Status => {
            let status = schema_status(db.pool()).await?;
            print_status(&status, format);
        }
        MigrateCommand::Check => {
            let health = db.health().await?;
            if format == OutputFormat::Json {
                output::print_json(&health);
                return Ok(());
            }
            output::print_kv("Latency", &format!("{} ms", health.latency.as_millis()));
            output::print_kv(
                "Connections",
                &format!("{} open, {} idle", health.pool_size, health.idle_connections),
            );
            output::print_kv("Applied", &health.schema.applied.len().to_string());
            output::print_kv("Pending", &health.schema.pending.len().to_string());
            if health.is_ready() {
                output::print_success("Database is reachable and migrated.");
            } else {
                output::print_warning("Database is reachable but migrations are pending.");
            }
        }
    }
    Ok(())
}

fn print_status(status: &SchemaStatus, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(status);
        return;
    }
    if status.is_current() {
        output::print_success(&format!(
            "No pending migrations ({} applied).",
            status.applied.len()
        ));
        return;
    }
    let rows: Vec<PendingRow> = status
        .pending
        .iter()
        .map(|m| PendingRow {
            version: m.version,
            description: m.description.clone(),
        })
        .collect();
    output::print_list(&rows, OutputFormat::Table);
}
