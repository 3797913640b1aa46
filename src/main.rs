//! AlertHub Server: alert targeting and delivery with reminders
//!
//! Main entry point: loads configuration, initialises logging and runs the
//! delivery service until shutdown.

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use alerthub_core::config::AppConfig;
use alerthub_core::error::AppError;
use alerthub_worker::{ServeOptions, run_service};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run_service(config, ServeOptions::default()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `ALERTHUB_ENV`
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("ALERTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
