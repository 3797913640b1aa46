//! Periodic sweep configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Intervals for the reminder sweep and the snooze-reset sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the sweeps run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between reminder sweeps.
    #[serde(default = "default_reminder_interval")]
    pub reminder_interval_seconds: u64,
    /// Seconds between expired-snooze resets.
    #[serde(default = "default_snooze_reset_interval")]
    pub snooze_reset_interval_seconds: u64,
}

impl SchedulerConfig {
    /// Reminder sweep period.
    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_seconds)
    }

    /// Snooze reset period.
    pub fn snooze_reset_interval(&self) -> Duration {
        Duration::from_secs(self.snooze_reset_interval_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_interval_seconds: default_reminder_interval(),
            snooze_reset_interval_seconds: default_snooze_reset_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_reminder_interval() -> u64 {
    2 * 60 * 60
}

fn default_snooze_reset_interval() -> u64 {
    24 * 60 * 60
}
