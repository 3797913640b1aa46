//! Interval scheduler for the periodic sweeps.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use alerthub_core::config::SchedulerConfig;
use alerthub_core::error::AppError;

use crate::sweeps::{ReminderSweep, SnoozeResetSweep};
use crate::task::GuardedSweep;

/// Runs each registered sweep on its own fixed interval.
///
/// Ticks of the same sweep never overlap; a tick that fires while the
/// previous pass is still running is skipped.
pub struct SweepScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Registered sweeps, in registration order
    sweeps: Vec<GuardedSweep>,
}

impl std::fmt::Debug for SweepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepScheduler")
            .field(
                "sweeps",
                &self.sweeps.iter().map(GuardedSweep::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SweepScheduler {
    /// Create a new sweep scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            sweeps: Vec::new(),
        })
    }

    /// Register the reminder sweep and the snooze reset on their configured intervals.
    pub async fn register_default_sweeps(
        &mut self,
        reminders: Arc<ReminderSweep>,
        snooze_reset: Arc<SnoozeResetSweep>,
        config: &SchedulerConfig,
    ) -> Result<(), AppError> {
        self.register(GuardedSweep::new(reminders), config.reminder_interval())
            .await?;
        self.register(
            GuardedSweep::new(snooze_reset),
            config.snooze_reset_interval(),
        )
        .await?;

        tracing::info!("All sweeps registered");
        Ok(())
    }

    /// Run `sweep` every `interval`.
    pub async fn register(&mut self, sweep: GuardedSweep, interval: Duration) -> Result<(), AppError> {
        if interval.is_zero() {
            return Err(AppError::configuration(format!(
                "Sweep '{}' needs a non-zero interval",
                sweep.name()
            )));
        }

        let name = sweep.name().to_string();
        let ticking = sweep.clone();
        let job = CronJob::new_repeated_async(interval, move |_uuid, _lock| {
            let sweep = ticking.clone();
            Box::pin(async move {
                tracing::debug!("Tick for sweep '{}'", sweep.name());
                let _ = sweep.tick().await;
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create {} schedule: {}", name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {} schedule: {}", name, e)))?;

        tracing::info!("Registered: {} (every {}s)", name, interval.as_secs());
        self.sweeps.push(sweep);
        Ok(())
    }

    /// Registered sweeps, for running a pass out of schedule.
    pub fn sweeps(&self) -> &[GuardedSweep] {
        &self.sweeps
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Sweep scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Sweep scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;

    #[tokio::test]
    async fn test_registers_both_sweeps() {
        let h = Harness::new();
        let mut scheduler = SweepScheduler::new().await.unwrap();
        scheduler
            .register_default_sweeps(
                Arc::new(h.reminder_sweep()),
                Arc::new(h.snooze_reset()),
                &SchedulerConfig::default(),
            )
            .await
            .unwrap();

        let names: Vec<_> = scheduler.sweeps().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["reminder_sweep", "snooze_reset"]);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let h = Harness::new();
        let mut scheduler = SweepScheduler::new().await.unwrap();
        let err = scheduler
            .register(GuardedSweep::new(Arc::new(h.snooze_reset())), Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.kind, alerthub_core::error::ErrorKind::Configuration);
        assert!(scheduler.sweeps().is_empty());
    }
}
