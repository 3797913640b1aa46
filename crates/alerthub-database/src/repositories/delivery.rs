//! Delivery record repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use alerthub_core::error::AppResult;
use alerthub_entity::delivery::DeliveryRecord;

use super::db_error;
use crate::store::{DeliveryStore, DeliveryTotals, StatusCount};

/// Repository for the delivery log.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: PgPool,
}

impl DeliveryRepository {
    /// Create a new delivery repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryStore for DeliveryRepository {
    async fn insert_delivery(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord> {
        sqlx::query_as::<_, DeliveryRecord>(
            "INSERT INTO delivery_records (id, alert_id, user_id, channel, status, sent_at, read_at, \
             failure_reason, is_reminder, reminder_count, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(record.id)
        .bind(record.alert_id)
        .bind(record.user_id)
        .bind(record.channel)
        .bind(record.status)
        .bind(record.sent_at)
        .bind(record.read_at)
        .bind(&record.failure_reason)
        .bind(record.is_reminder)
        .bind(record.reminder_count)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to record delivery"))
    }

    async fn mark_deliveries_read(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE delivery_records SET status = 'read', read_at = $3, updated_at = $3 \
             WHERE user_id = $1 AND alert_id = $2 AND status = 'sent'",
        )
        .bind(user_id)
        .bind(alert_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark deliveries read"))?;
        Ok(result.rows_affected())
    }

    async fn find_deliveries_for_alert(&self, alert_id: Uuid) -> AppResult<Vec<DeliveryRecord>> {
        sqlx::query_as::<_, DeliveryRecord>(
            "SELECT * FROM delivery_records WHERE alert_id = $1 ORDER BY created_at",
        )
        .bind(alert_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list deliveries"))
    }

    async fn status_breakdown(&self, alert_id: Uuid) -> AppResult<Vec<StatusCount>> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM delivery_records \
             WHERE alert_id = $1 GROUP BY status ORDER BY status",
        )
        .bind(alert_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to compute status breakdown"))
    }

    async fn delivery_totals(&self) -> AppResult<DeliveryTotals> {
        sqlx::query_as::<_, DeliveryTotals>(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE status = 'read') AS read \
             FROM delivery_records",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to total deliveries"))
    }
}
