//! Reminder sweep: re-send every live alert as a reminder.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing;
use uuid::Uuid;

use alerthub_core::Clock;
use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::AlertStore;
use alerthub_service::orchestrator::{AlertSendReport, AlertSkipReason, SendAlertResult, SendOrchestrator};

use crate::task::{SweepError, SweepOutcome, SweepTask};

/// What happened to one alert during a sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepEntryOutcome {
    /// The audience was processed.
    Processed(AlertSendReport),
    /// The alert was no longer eligible when re-read.
    Skipped {
        /// Why.
        reason: AlertSkipReason,
    },
    /// The alert could not be processed at all.
    Failed {
        /// Error text.
        error: String,
    },
}

/// Per-alert entry of a sweep report.
#[derive(Debug, Clone, Serialize)]
pub struct AlertSweepEntry {
    /// The alert.
    pub alert_id: Uuid,
    /// Its title.
    pub title: String,
    /// What happened.
    pub outcome: SweepEntryOutcome,
}

/// Result of one reminder sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderSweepReport {
    /// When the sweep enumerated its candidates.
    pub started_at: DateTime<Utc>,
    /// One entry per candidate alert.
    pub entries: Vec<AlertSweepEntry>,
}

impl ReminderSweepReport {
    /// Alerts that could not be processed.
    pub fn failed_alerts(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, SweepEntryOutcome::Failed { .. }))
            .count()
    }

    /// Reminders delivered across all alerts.
    pub fn reminders_sent(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                SweepEntryOutcome::Processed(report) => Some(report.sent),
                _ => None,
            })
            .sum()
    }
}

/// Sends reminders for every alert inside its active reminder window.
#[derive(Debug, Clone)]
pub struct ReminderSweep {
    alerts: Arc<dyn AlertStore>,
    orchestrator: SendOrchestrator,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl ReminderSweep {
    /// Create a new reminder sweep
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        orchestrator: SendOrchestrator,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            alerts,
            orchestrator,
            clock,
            store_timeout,
        }
    }

    /// Send reminders for all live, reminder-enabled, in-window alerts.
    ///
    /// Fails only if the candidates cannot be listed. A failure on one alert
    /// becomes a failed entry and the sweep moves on.
    pub async fn process_reminders(&self) -> AppResult<ReminderSweepReport> {
        let started_at = self.clock.now();
        let candidates = bounded(
            "list reminder candidates",
            self.store_timeout,
            self.alerts.find_reminder_candidates(started_at),
        )
        .await?;

        tracing::info!("Reminder sweep: {} candidate alerts", candidates.len());

        let mut entries = Vec::with_capacity(candidates.len());
        for alert in candidates {
            let outcome = match self.orchestrator.send_alert(alert.id, true).await {
                Ok(SendAlertResult::Delivered(report)) => SweepEntryOutcome::Processed(report),
                Ok(SendAlertResult::Skipped { reason, .. }) => SweepEntryOutcome::Skipped { reason },
                Err(e) => {
                    tracing::error!(alert_id = %alert.id, error = %e, "Reminder sweep failed for alert");
                    SweepEntryOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            entries.push(AlertSweepEntry {
                alert_id: alert.id,
                title: alert.title,
                outcome,
            });
        }

        Ok(ReminderSweepReport {
            started_at,
            entries,
        })
    }
}

#[async_trait]
impl SweepTask for ReminderSweep {
    fn name(&self) -> &str {
        "reminder_sweep"
    }

    async fn execute(&self) -> Result<SweepOutcome, SweepError> {
        self.process_reminders()
            .await
            .map(SweepOutcome::Reminders)
            .map_err(|e| SweepError::from_app("Reminder sweep could not list alerts", e))
    }
}
