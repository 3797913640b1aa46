//! Snooze reset sweep: clear snoozes whose expiry has passed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing;

use alerthub_core::Clock;
use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::PreferenceStore;

use crate::task::{SweepError, SweepOutcome, SweepTask};

/// Clears lapsed snoozes in one bulk update.
#[derive(Debug, Clone)]
pub struct SnoozeResetSweep {
    preferences: Arc<dyn PreferenceStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl SnoozeResetSweep {
    /// Create a new snooze reset sweep
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            preferences,
            clock,
            store_timeout,
        }
    }

    /// Clear every snooze with `snooze_until` before now. Returns rows changed.
    pub async fn reset_expired_snoozes(&self) -> AppResult<u64> {
        let cleared = bounded(
            "reset expired snoozes",
            self.store_timeout,
            self.preferences.reset_expired_snoozes(self.clock.now()),
        )
        .await?;

        tracing::info!("Snooze reset: cleared {} expired snoozes", cleared);
        Ok(cleared)
    }
}

#[async_trait]
impl SweepTask for SnoozeResetSweep {
    fn name(&self) -> &str {
        "snooze_reset"
    }

    async fn execute(&self) -> Result<SweepOutcome, SweepError> {
        self.reset_expired_snoozes()
            .await
            .map(|cleared| SweepOutcome::SnoozeReset { cleared })
            .map_err(|e| SweepError::from_app("Snooze reset failed", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use alerthub_entity::preference::DeliveryPreference;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_clears_only_lapsed_snoozes() {
        let h = Harness::new();
        let alert = Uuid::new_v4();
        for hours in [-3, -1, 4] {
            let mut pref = DeliveryPreference::new(Uuid::new_v4(), alert, h.now());
            pref.snooze(h.now() + chrono::Duration::hours(hours), h.now());
            h.store.put_preference(pref).await;
        }

        let outcome = h.snooze_reset().execute().await.unwrap();
        assert!(matches!(outcome, SweepOutcome::SnoozeReset { cleared: 2 }));

        let prefs = h.store.preferences().await;
        assert_eq!(prefs.iter().filter(|p| p.is_snoozed).count(), 1);
        assert!(
            prefs
                .iter()
                .filter(|p| !p.is_snoozed)
                .all(|p| p.snooze_until.is_none())
        );
        assert_eq!(h.snooze_reset().reset_expired_snoozes().await.unwrap(), 0);
    }
}
