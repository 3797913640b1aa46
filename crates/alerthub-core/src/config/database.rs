//! Database configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Connections the two sweeps can hold at once while a user action runs.
pub const MIN_POOL_SIZE: u32 = 3;

/// PostgreSQL pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Pool ceiling. Must leave room for both sweeps plus request traffic.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept warm between sweep ticks.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long to wait for a free connection, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connections are dropped after this many seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Server-side `statement_timeout` set on every pooled connection.
    ///
    /// Unset leaves the server default. Keep it at or above
    /// `delivery.store_timeout_ms` so the client bound fires first.
    #[serde(default)]
    pub statement_timeout_ms: Option<u64>,
    /// Apply pending migrations when the service starts.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    /// Acquire budget for one connection.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Idle lifetime of a pooled connection.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Check the pool settings in isolation.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.url.starts_with("postgres://") || self.url.starts_with("postgresql://")) {
            return Err(AppError::configuration(
                "database.url must be a postgres:// or postgresql:// URL",
            ));
        }
        if self.max_connections < MIN_POOL_SIZE {
            return Err(AppError::configuration(format!(
                "database.max_connections must be at least {MIN_POOL_SIZE}"
            )));
        }
        if self.min_connections > self.max_connections {
            return Err(AppError::configuration(
                "database.min_connections cannot exceed database.max_connections",
            ));
        }
        if self.connect_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "database.connect_timeout_seconds must be greater than zero",
            ));
        }
        if self.statement_timeout_ms == Some(0) {
            return Err(AppError::configuration(
                "database.statement_timeout_ms must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_auto_migrate() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://alerthub@localhost/alerthub".to_string(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_seconds: default_connect_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            statement_timeout_ms: None,
            auto_migrate: true,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_pool_too_small_for_sweeps() {
        let mut cfg = config();
        cfg.max_connections = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_inverted_pool_bounds() {
        let mut cfg = config();
        cfg.min_connections = 11;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_non_postgres_url() {
        let mut cfg = config();
        cfg.url = "mysql://localhost/alerthub".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_statement_timeout() {
        let mut cfg = config();
        cfg.statement_timeout_ms = Some(0);
        assert!(cfg.validate().is_err());
        cfg.statement_timeout_ms = Some(10_000);
        assert!(cfg.validate().is_ok());
    }
}
