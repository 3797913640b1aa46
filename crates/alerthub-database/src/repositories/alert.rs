//! Alert repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use alerthub_core::error::AppResult;
use alerthub_entity::alert::Alert;
use alerthub_entity::user::User;

use super::db_error;
use crate::store::{AlertCounts, AlertDimension, AlertStore, DailyCount, LabelCount};

const SEVERITY_ORDER: &str =
    "CASE severity WHEN 'Critical' THEN 3 WHEN 'Warning' THEN 2 ELSE 1 END DESC, created_at DESC";

/// Repository for alert rows.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Create a new alert repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for AlertRepository {
    async fn find_alert(&self, id: Uuid) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find alert"))
    }

    async fn insert_alert(&self, alert: &Alert) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(
            "INSERT INTO alerts (id, title, message, severity, delivery_channel, visibility, \
             target_organization, target_team_ids, target_user_ids, reminder_enabled, \
             reminder_frequency_hours, start_time, expiry_time, is_active, is_archived, \
             created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING *",
        )
        .bind(alert.id)
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(alert.severity)
        .bind(alert.delivery_channel)
        .bind(alert.visibility)
        .bind(&alert.target_organization)
        .bind(&alert.target_team_ids)
        .bind(&alert.target_user_ids)
        .bind(alert.reminder_enabled)
        .bind(alert.reminder_frequency_hours)
        .bind(alert.start_time)
        .bind(alert.expiry_time)
        .bind(alert.is_active)
        .bind(alert.is_archived)
        .bind(alert.created_by)
        .bind(alert.created_at)
        .bind(alert.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create alert"))
    }

    async fn archive_alert(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET is_archived = TRUE, is_active = FALSE, updated_at = $2 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to archive alert"))
    }

    async fn set_alert_active(
        &self,
        id: Uuid,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET is_active = $2, updated_at = $3 \
             WHERE id = $1 AND NOT is_archived RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update alert activation"))
    }

    async fn find_reminder_candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT * FROM alerts \
             WHERE is_active AND NOT is_archived AND reminder_enabled \
             AND start_time <= $1 AND expiry_time > $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list reminder candidates"))
    }

    async fn find_visible_alerts(&self, user: &User, now: DateTime<Utc>) -> AppResult<Vec<Alert>> {
        let sql = format!(
            "SELECT * FROM alerts \
             WHERE is_active AND NOT is_archived AND start_time <= $1 AND expiry_time > $1 \
             AND ((visibility = 'Organization' AND target_organization = $2) \
               OR (visibility = 'Team' AND $3 = ANY(target_team_ids)) \
               OR (visibility = 'User' AND $4 = ANY(target_user_ids))) \
             ORDER BY {SEVERITY_ORDER}"
        );

        sqlx::query_as::<_, Alert>(&sql)
            .bind(now)
            .bind(&user.organization)
            .bind(user.team_id)
            .bind(user.id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list visible alerts"))
    }

    async fn list_alerts(&self) -> AppResult<Vec<Alert>> {
        sqlx::query_as::<_, Alert>("SELECT * FROM alerts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list alerts"))
    }

    async fn count_alerts(&self, now: DateTime<Utc>) -> AppResult<AlertCounts> {
        sqlx::query_as::<_, AlertCounts>(
            "SELECT COUNT(*) AS total, \
             COUNT(*) FILTER (WHERE is_active AND expiry_time > $1) AS active, \
             COUNT(*) FILTER (WHERE expiry_time <= $1) AS expired \
             FROM alerts WHERE NOT is_archived",
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count alerts"))
    }

    async fn count_alerts_by(&self, dimension: AlertDimension) -> AppResult<Vec<LabelCount>> {
        let column = dimension.column();
        let sql = format!(
            "SELECT {column} AS label, COUNT(*) AS count FROM alerts \
             WHERE NOT is_archived GROUP BY {column} ORDER BY {column}"
        );

        sqlx::query_as::<_, LabelCount>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to group alerts"))
    }

    async fn count_alerts_created_per_day(
        &self,
        since: DateTime<Utc>,
        offset: FixedOffset,
    ) -> AppResult<Vec<DailyCount>> {
        sqlx::query_as::<_, DailyCount>(
            "SELECT ((created_at AT TIME ZONE 'UTC') + make_interval(secs => $2))::date AS day, \
             COUNT(*) AS count FROM alerts \
             WHERE NOT is_archived AND created_at >= $1 \
             GROUP BY day ORDER BY day",
        )
        .bind(since)
        .bind(f64::from(offset.local_minus_utc()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to count recent alerts"))
    }
}
