//! `alerthub-cli`: operate the delivery engine from a terminal.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use alerthub_core::error::{AppError, ErrorKind};
use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Distinct codes let scripts tell bad input from an unreachable store.
fn exit_code(err: &AppError) -> u8 {
    match err.kind {
        ErrorKind::NotFound => 2,
        ErrorKind::Validation | ErrorKind::Conflict => 3,
        ErrorKind::Configuration => 4,
        ErrorKind::Database | ErrorKind::ServiceUnavailable => 5,
        _ => 1,
    }
}
