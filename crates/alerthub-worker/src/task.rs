//! Sweep task abstraction and the non-overlap guard.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing;

use alerthub_core::error::{AppError, ErrorKind};

use crate::sweeps::ReminderSweepReport;

/// A periodic batch pass.
#[async_trait]
pub trait SweepTask: Send + Sync + std::fmt::Debug {
    /// Stable task name used in logs.
    fn name(&self) -> &str;

    /// Run one full pass.
    async fn execute(&self) -> Result<SweepOutcome, SweepError>;
}

/// What a completed pass did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// Reminder sweep results, one entry per alert.
    Reminders(ReminderSweepReport),
    /// Number of snoozes cleared.
    SnoozeReset {
        /// Rows changed.
        cleared: u64,
    },
}

/// Error from a sweep pass
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// The pass cannot succeed until something is fixed
    #[error("Permanent sweep failure: {0}")]
    Permanent(String),

    /// The next tick may succeed
    #[error("Transient sweep failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl SweepError {
    /// Classify an application error raised before any work was done.
    pub fn from_app(context: &str, err: AppError) -> Self {
        match err.kind {
            ErrorKind::Database | ErrorKind::ServiceUnavailable => {
                Self::Transient(format!("{context}: {err}"))
            }
            ErrorKind::Configuration | ErrorKind::Validation => {
                Self::Permanent(format!("{context}: {err}"))
            }
            _ => Self::Internal(err),
        }
    }
}

/// A sweep paired with a lock so that at most one pass runs at a time.
#[derive(Debug, Clone)]
pub struct GuardedSweep {
    task: Arc<dyn SweepTask>,
    running: Arc<Mutex<()>>,
}

impl GuardedSweep {
    /// Wrap a task.
    pub fn new(task: Arc<dyn SweepTask>) -> Self {
        Self {
            task,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Run one pass unless one is already in flight.
    ///
    /// Returns `None` when the tick was skipped because of overlap.
    pub async fn tick(&self) -> Option<Result<SweepOutcome, SweepError>> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!(
                "Sweep '{}' still running from a previous tick, skipping",
                self.task.name()
            );
            return None;
        };

        tracing::info!("Sweep '{}' started", self.task.name());
        let result = self.task.execute().await;

        match &result {
            Ok(SweepOutcome::Reminders(report)) => tracing::info!(
                task = self.task.name(),
                alerts = report.entries.len(),
                failed_alerts = report.failed_alerts(),
                "Sweep finished"
            ),
            Ok(SweepOutcome::SnoozeReset { cleared }) => tracing::info!(
                task = self.task.name(),
                cleared,
                "Sweep finished"
            ),
            Err(e) => tracing::error!("Sweep '{}' failed: {}", self.task.name(), e),
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug)]
    struct SlowSweep;

    #[async_trait]
    impl SweepTask for SlowSweep {
        fn name(&self) -> &str {
            "slow"
        }

        async fn execute(&self) -> Result<SweepOutcome, SweepError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(SweepOutcome::SnoozeReset { cleared: 0 })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_tick_is_skipped() {
        let sweep = GuardedSweep::new(Arc::new(SlowSweep));

        let first = {
            let sweep = sweep.clone();
            tokio::spawn(async move { sweep.tick().await })
        };
        tokio::task::yield_now().await;

        assert!(sweep.tick().await.is_none());
        assert!(first.await.unwrap().is_some());
        assert!(sweep.tick().await.is_some());
    }

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            SweepError::from_app("list", AppError::database("down")),
            SweepError::Transient(_)
        ));
        assert!(matches!(
            SweepError::from_app("list", AppError::configuration("bad")),
            SweepError::Permanent(_)
        ));
        assert!(matches!(
            SweepError::from_app("list", AppError::internal("bug")),
            SweepError::Internal(_)
        ));
    }
}
