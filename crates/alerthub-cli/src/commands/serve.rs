//! Run the delivery service.

use clap::Args;

use alerthub_core::error::AppError;
use alerthub_worker::{ServeOptions, run_service};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Skip database migrations on startup
    #[arg(long)]
    pub no_migrate: bool,

    /// Do not start the sweep scheduler
    #[arg(long)]
    pub no_sweeps: bool,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, env: &str) -> Result<(), AppError> {
    let mut config = super::load_config(env)?;
    if args.no_sweeps {
        config.scheduler.enabled = false;
    }

    println!("Starting AlertHub...");
    println!("  Environment:       {}", env);
    println!("  Reminder interval: {}s", config.scheduler.reminder_interval_seconds);
    println!("  Snooze reset:      {}s", config.scheduler.snooze_reset_interval_seconds);

    run_service(
        config,
        ServeOptions {
            auto_migrate: !args.no_migrate,
        },
    )
    .await
}
