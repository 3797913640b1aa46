//! Channel dispatch configuration.

use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Settings for the channel dispatcher and the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Upper bound for a single transport attempt, in milliseconds.
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_ms: u64,
    /// Upper bound for a single store call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Offset of the organisation's local time zone, e.g. `"+02:00"`.
    ///
    /// End-of-day snoozes are computed in this zone.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Sender address used by the email channel.
    #[serde(default = "default_email_from")]
    pub email_from: String,
    /// Maximum SMS body length; longer bodies are truncated.
    #[serde(default = "default_sms_max_length")]
    pub sms_max_length: usize,
}

impl DeliveryConfig {
    /// Transport time budget.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Store time budget.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Reject budgets and limits the dispatcher cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.dispatch_timeout_ms == 0 {
            return Err(AppError::configuration(
                "delivery.dispatch_timeout_ms must be greater than zero",
            ));
        }
        if self.store_timeout_ms == 0 {
            return Err(AppError::configuration(
                "delivery.store_timeout_ms must be greater than zero",
            ));
        }
        // Room for at least one character before the "..." marker.
        if self.sms_max_length < 4 {
            return Err(AppError::configuration(
                "delivery.sms_max_length must be at least 4",
            ));
        }
        self.offset()?;
        Ok(())
    }

    /// Parse the configured offset.
    pub fn offset(&self) -> Result<FixedOffset, AppError> {
        self.utc_offset.parse::<FixedOffset>().map_err(|e| {
            AppError::configuration(format!(
                "Invalid delivery.utc_offset '{}': {e}",
                self.utc_offset
            ))
        })
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: default_dispatch_timeout(),
            store_timeout_ms: default_store_timeout(),
            utc_offset: default_utc_offset(),
            email_from: default_email_from(),
            sms_max_length: default_sms_max_length(),
        }
    }
}

fn default_dispatch_timeout() -> u64 {
    5_000
}

fn default_store_timeout() -> u64 {
    5_000
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_email_from() -> String {
    "noreply@alerthub.local".to_string()
}

fn default_sms_max_length() -> usize {
    160
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_positive_offset() {
        let cfg = DeliveryConfig {
            utc_offset: "+05:30".to_string(),
            ..DeliveryConfig::default()
        };
        assert_eq!(cfg.offset().unwrap().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn test_zero_budgets_rejected() {
        let cfg = DeliveryConfig {
            dispatch_timeout_ms: 0,
            ..DeliveryConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = DeliveryConfig {
            store_timeout_ms: 0,
            ..DeliveryConfig::default()
        };
        assert!(cfg.validate().is_err());

        assert!(DeliveryConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_is_utc() {
        assert_eq!(DeliveryConfig::default().offset().unwrap().local_minus_utc(), 0);
    }
}
