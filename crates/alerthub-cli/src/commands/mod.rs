//! CLI command definitions and dispatch.

pub mod alert;
pub mod inbox;
pub mod migrate;
pub mod seed;
pub mod serve;
pub mod sweep;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use alerthub_core::SystemClock;
use alerthub_core::config::AppConfig;
use alerthub_core::error::AppError;
use alerthub_database::DatabasePool;
use alerthub_database::repositories::postgres_stores;
use alerthub_entity::user::User;
use alerthub_service::Engine;

/// AlertHub: alert targeting and delivery with reminders
#[derive(Debug, Parser)]
#[command(name = "alerthub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (overlay file under config/)
    #[arg(short, long, env = "ALERTHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Log more (`-v` info, `-vv` debug); `RUST_LOG` takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the delivery service with its sweeps
    Serve(serve::ServeArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Load the demo organisation
    Seed(seed::SeedArgs),
    /// Alert management
    Alert(alert::AlertArgs),
    /// A user's view of their alerts
    Inbox(inbox::InboxArgs),
    /// Run a sweep once, out of schedule
    Sweep(sweep::SweepArgs),
}

impl Cli {
    /// Log filter implied by `--verbose`.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info,sqlx=warn",
            _ => "debug,sqlx=info",
        }
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, &self.env).await,
            Commands::Migrate(args) => migrate::execute(args, &self.env, self.format).await,
            Commands::Seed(args) => seed::execute(args, &self.env).await,
            Commands::Alert(args) => alert::execute(args, &self.env, self.format).await,
            Commands::Inbox(args) => inbox::execute(args, &self.env, self.format).await,
            Commands::Sweep(args) => sweep::execute(args, &self.env, self.format).await,
        }
    }
}

/// Helper: load configuration for an environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: connect to the database and wire the engine over it
pub async fn open_engine(config: &AppConfig) -> Result<(DatabasePool, Engine), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    let engine = Engine::build(
        postgres_stores(db.pool()),
        Arc::new(SystemClock),
        &config.delivery,
    )?;
    Ok((db, engine))
}

/// Helper: look a user up by username
pub async fn require_user(engine: &Engine, username: &str) -> Result<User, AppError> {
    engine
        .stores
        .directory
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{}' not found", username)))
}
