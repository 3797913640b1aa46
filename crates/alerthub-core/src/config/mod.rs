//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod delivery;
pub mod logging;
pub mod scheduler;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::delivery::DeliveryConfig;
pub use self::logging::LoggingConfig;
pub use self::scheduler::SchedulerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Periodic sweep settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Channel dispatch settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `ALERTHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ALERTHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject values that would make the sweeps or dispatcher misbehave.
    pub fn validate(&self) -> Result<(), AppError> {
        self.database.validate()?;
        self.delivery.validate()?;
        if let Some(statement_ms) = self.database.statement_timeout_ms {
            if statement_ms < self.delivery.store_timeout_ms {
                return Err(AppError::configuration(
                    "database.statement_timeout_ms must not be below delivery.store_timeout_ms",
                ));
            }
        }
        if self.scheduler.reminder_interval_seconds == 0 {
            return Err(AppError::configuration(
                "scheduler.reminder_interval_seconds must be greater than zero",
            ));
        }
        if self.scheduler.snooze_reset_interval_seconds == 0 {
            return Err(AppError::configuration(
                "scheduler.snooze_reset_interval_seconds must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "postgres://localhost/alerthub".to_string(),
                max_connections: 5,
                min_connections: 1,
                connect_timeout_seconds: 5,
                idle_timeout_seconds: 60,
                statement_timeout_ms: None,
                auto_migrate: true,
            },
            scheduler: SchedulerConfig::default(),
            delivery: DeliveryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut cfg = base();
        cfg.scheduler.reminder_interval_seconds = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_store_timeout_rejected() {
        let mut cfg = base();
        cfg.delivery.store_timeout_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.delivery.dispatch_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_statement_timeout_below_store_budget_rejected() {
        let mut cfg = base();
        cfg.database.statement_timeout_ms = Some(cfg.delivery.store_timeout_ms - 1);
        assert!(cfg.validate().is_err());
        cfg.database.statement_timeout_ms = Some(cfg.delivery.store_timeout_ms);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_bad_offset_rejected() {
        let mut cfg = base();
        cfg.delivery.utc_offset = "Mars/Olympus".to_string();
        assert!(cfg.validate().is_err());
    }
}
