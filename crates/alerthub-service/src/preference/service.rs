//! Delivery preference accessor.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::{DeliveryStore, PreferenceStore};
use alerthub_entity::preference::{DeliveryPreference, end_of_local_day};

/// Reads and mutates delivery preferences.
#[derive(Debug, Clone)]
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
    deliveries: Arc<dyn DeliveryStore>,
    clock: Arc<dyn Clock>,
    /// Local zone for end-of-day snoozes.
    offset: FixedOffset,
    store_timeout: Duration,
}

impl PreferenceService {
    /// Creates a new preference service.
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        deliveries: Arc<dyn DeliveryStore>,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            deliveries,
            clock,
            offset,
            store_timeout,
        }
    }

    /// Existing row for the pair, or a freshly created zero-state row.
    pub async fn get_or_create(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        bounded(
            "get or create preference",
            self.store_timeout,
            self.store
                .get_or_create_preference(user_id, alert_id, self.clock.now()),
        )
        .await
    }

    /// Whether the snooze on `pref` is live right now.
    pub fn is_snoozed_now(&self, pref: &DeliveryPreference) -> bool {
        pref.is_snoozed_at(self.clock.now())
    }

    /// Whether a reminder may go out now at the given cadence.
    pub fn should_receive_reminder(&self, pref: &DeliveryPreference, frequency: chrono::Duration) -> bool {
        pref.should_receive_reminder_at(frequency, self.clock.now())
    }

    /// Stamp a successful send on the pair's row.
    ///
    /// Only `last_reminder_sent_at` is written, so a read or snooze made
    /// while the send was in flight survives.
    pub async fn record_send(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        bounded(
            "stamp reminder",
            self.store_timeout,
            self.store
                .stamp_reminder_sent(user_id, alert_id, self.clock.now()),
        )
        .await?
        .ok_or_else(|| missing(user_id, alert_id))
    }

    /// Mark the alert read and move the pair's sent deliveries to read.
    pub async fn mark_read(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        self.get_or_create(user_id, alert_id).await?;
        let now = self.clock.now();
        let pref = self.set_read_state(user_id, alert_id, true, now).await?;

        let moved = bounded(
            "mark deliveries read",
            self.store_timeout,
            self.deliveries.mark_deliveries_read(user_id, alert_id, now),
        )
        .await?;

        debug!(%user_id, %alert_id, deliveries = moved, "Alert marked read");
        Ok(pref)
    }

    /// Clear the read state. Fails with `NotFound` if the pair has no row.
    pub async fn mark_unread(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        self.set_read_state(user_id, alert_id, false, self.clock.now())
            .await
    }

    /// Snooze until 23:59:59.999999 of the current local day.
    pub async fn snooze_until_end_of_day(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
    ) -> AppResult<DeliveryPreference> {
        self.get_or_create(user_id, alert_id).await?;
        let now = self.clock.now();
        let until = end_of_local_day(now, self.offset);
        let pref = bounded(
            "snooze preference",
            self.store_timeout,
            self.store.snooze_preference(user_id, alert_id, until, now),
        )
        .await?
        .ok_or_else(|| missing(user_id, alert_id))?;

        info!(%user_id, %alert_id, snooze_until = %until, "Alert snoozed for the day");
        Ok(pref)
    }

    /// Rows of `user_id` whose snooze is live right now.
    pub async fn snoozed_for_user(&self, user_id: Uuid) -> AppResult<Vec<DeliveryPreference>> {
        bounded(
            "list snoozed preferences",
            self.store_timeout,
            self.store.find_snoozed_for_user(user_id, self.clock.now()),
        )
        .await
    }

    /// Find the row for the pair without creating it.
    pub async fn find(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<Option<DeliveryPreference>> {
        bounded(
            "find preference",
            self.store_timeout,
            self.store.find_preference(user_id, alert_id),
        )
        .await
    }

    async fn set_read_state(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        is_read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<DeliveryPreference> {
        bounded(
            "update read state",
            self.store_timeout,
            self.store.set_read_state(user_id, alert_id, is_read, now),
        )
        .await?
        .ok_or_else(|| missing(user_id, alert_id))
    }
}

fn missing(user_id: Uuid, alert_id: Uuid) -> AppError {
    AppError::not_found(format!(
        "No delivery preference for user {user_id} and alert {alert_id}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use alerthub_core::error::ErrorKind;
    use alerthub_entity::alert::DeliveryChannel;
    use alerthub_entity::delivery::{DeliveryRecord, DeliveryStatus};

    #[tokio::test]
    async fn test_get_or_create_returns_zero_state_once() {
        let fx = Fixture::new().await;
        let prefs = fx.preferences();
        let (user, alert) = (Uuid::new_v4(), Uuid::new_v4());

        let first = prefs.get_or_create(user, alert).await.unwrap();
        assert!(!first.is_read);
        assert!(!first.is_snoozed);
        assert!(first.last_reminder_sent_at.is_none());

        let second = prefs.get_or_create(user, alert).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_reminder_cadence_boundaries() {
        let fx = Fixture::new().await;
        let prefs = fx.preferences();
        let mut pref = prefs.get_or_create(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
        assert!(prefs.should_receive_reminder(&pref, chrono::Duration::hours(2)));

        pref.last_reminder_sent_at = Some(fx.now() - chrono::Duration::hours(2));
        assert!(prefs.should_receive_reminder(&pref, chrono::Duration::hours(2)));

        pref.last_reminder_sent_at =
            Some(fx.now() - chrono::Duration::hours(2) + chrono::Duration::seconds(1));
        assert!(!prefs.should_receive_reminder(&pref, chrono::Duration::hours(2)));
    }

    #[tokio::test]
    async fn test_snooze_round_trip_across_days() {
        let fx = Fixture::new().await;
        let prefs = fx.preferences();
        let (user, alert) = (Uuid::new_v4(), Uuid::new_v4());

        let pref = prefs.snooze_until_end_of_day(user, alert).await.unwrap();
        assert!(prefs.is_snoozed_now(&pref));
        assert!(!prefs.should_receive_reminder(&pref, chrono::Duration::hours(2)));
        assert_eq!(prefs.snoozed_for_user(user).await.unwrap().len(), 1);

        fx.clock.advance(chrono::Duration::days(1));
        let pref = prefs.get_or_create(user, alert).await.unwrap();
        assert!(!prefs.is_snoozed_now(&pref));
        assert!(prefs.snoozed_for_user(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_cascades_to_sent_deliveries() {
        let fx = Fixture::new().await;
        let prefs = fx.preferences();
        let (user, alert) = (Uuid::new_v4(), Uuid::new_v4());
        fx.store
            .insert_delivery(&DeliveryRecord::sent(alert, user, DeliveryChannel::Email, false, fx.now()))
            .await
            .unwrap();

        let pref = prefs.mark_read(user, alert).await.unwrap();
        assert!(pref.is_read);
        assert_eq!(pref.read_at, Some(fx.now()));

        let records = fx.store.deliveries().await;
        assert_eq!(records[0].status, DeliveryStatus::Read);
        assert_eq!(records[0].read_at, Some(fx.now()));

        let pref = prefs.mark_unread(user, alert).await.unwrap();
        assert!(!pref.is_read);
        assert!(pref.read_at.is_none());
    }

    #[tokio::test]
    async fn test_mark_unread_without_row_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx
            .preferences()
            .mark_unread(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(fx.store.preferences().await.is_empty());
    }
}
