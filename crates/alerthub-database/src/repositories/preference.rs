//! Delivery preference repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use alerthub_core::error::AppResult;
use alerthub_entity::preference::DeliveryPreference;

use super::db_error;
use crate::store::PreferenceStore;

/// Repository for per-(user, alert) preference rows.
#[derive(Debug, Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PreferenceRepository {
    async fn get_or_create_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<DeliveryPreference> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let fresh = DeliveryPreference::new(user_id, alert_id, now);
        sqlx::query_as::<_, DeliveryPreference>(
            "INSERT INTO delivery_preferences (id, user_id, alert_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT (user_id, alert_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING *",
        )
        .bind(fresh.id)
        .bind(user_id)
        .bind(alert_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to get or create preference"))
    }

    async fn find_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
    ) -> AppResult<Option<DeliveryPreference>> {
        sqlx::query_as::<_, DeliveryPreference>(
            "SELECT * FROM delivery_preferences WHERE user_id = $1 AND alert_id = $2",
        )
        .bind(user_id)
        .bind(alert_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find preference"))
    }

    async fn stamp_reminder_sent(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>> {
        sqlx::query_as::<_, DeliveryPreference>(
            "UPDATE delivery_preferences SET last_reminder_sent_at = $3, updated_at = $3 \
             WHERE user_id = $1 AND alert_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to stamp reminder"))
    }

    async fn set_read_state(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        is_read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>> {
        sqlx::query_as::<_, DeliveryPreference>(
            "UPDATE delivery_preferences SET is_read = $3, read_at = $4, updated_at = $5 \
             WHERE user_id = $1 AND alert_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(is_read)
        .bind(is_read.then_some(now))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update read state"))
    }

    async fn snooze_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>> {
        sqlx::query_as::<_, DeliveryPreference>(
            "UPDATE delivery_preferences SET is_snoozed = TRUE, snoozed_at = $4, \
             snooze_until = $3, updated_at = $4 \
             WHERE user_id = $1 AND alert_id = $2 RETURNING *",
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to snooze preference"))
    }

    async fn find_snoozed_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DeliveryPreference>> {
        sqlx::query_as::<_, DeliveryPreference>(
            "SELECT * FROM delivery_preferences \
             WHERE user_id = $1 AND is_snoozed AND snooze_until > $2 \
             ORDER BY snooze_until",
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list snoozed preferences"))
    }

    async fn reset_expired_snoozes(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE delivery_preferences SET is_snoozed = FALSE, snooze_until = NULL, updated_at = $1 \
             WHERE is_snoozed AND snooze_until < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to reset expired snoozes"))?;
        Ok(result.rows_affected())
    }

    async fn count_snoozed_for_alert(&self, alert_id: Uuid, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM delivery_preferences \
             WHERE alert_id = $1 AND is_snoozed AND snooze_until > $2",
        )
        .bind(alert_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count snoozed preferences"))
    }

    async fn count_snoozed(&self, now: DateTime<Utc>) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM delivery_preferences WHERE is_snoozed AND snooze_until > $1",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count snoozed preferences"))
    }
}
