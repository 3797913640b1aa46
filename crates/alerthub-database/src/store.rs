//! Store traits consumed by the delivery engine.
//!
//! Every method is a single round trip against the backing store. Both the
//! PostgreSQL repositories and [`MemoryStore`](crate::memory::MemoryStore)
//! implement all four traits with identical semantics.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_core::error::AppResult;
use alerthub_entity::alert::Alert;
use alerthub_entity::delivery::{DeliveryRecord, DeliveryStatus};
use alerthub_entity::preference::DeliveryPreference;
use alerthub_entity::team::Team;
use alerthub_entity::user::User;

/// Number of delivery records in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCount {
    /// The status.
    pub status: DeliveryStatus,
    /// How many records carry it.
    pub count: i64,
}

/// Attribute by which unarchived alerts are grouped in breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDimension {
    /// `Info`, `Warning`, `Critical`.
    Severity,
    /// `InApp`, `Email`, `SMS`.
    DeliveryChannel,
    /// `Organization`, `Team`, `User`.
    Visibility,
}

impl AlertDimension {
    /// Column holding this attribute in the `alerts` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Severity => "severity",
            Self::DeliveryChannel => "delivery_channel",
            Self::Visibility => "visibility",
        }
    }

    /// Stored label of this attribute on `alert`.
    pub fn label_of(&self, alert: &Alert) -> &'static str {
        match self {
            Self::Severity => alert.severity.as_str(),
            Self::DeliveryChannel => alert.delivery_channel.as_str(),
            Self::Visibility => alert.visibility.as_str(),
        }
    }
}

/// Number of unarchived alerts sharing one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LabelCount {
    /// Stored label, e.g. `Critical`.
    pub label: String,
    /// Alerts carrying it.
    pub count: i64,
}

/// Alerts created on one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyCount {
    /// The day in the configured offset.
    pub day: NaiveDate,
    /// Alerts created that day.
    pub count: i64,
}

/// Lifecycle counts over unarchived alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlertCounts {
    /// Every unarchived alert.
    pub total: i64,
    /// Active and not yet expired.
    pub active: i64,
    /// Expiry reached, active or not.
    pub expired: i64,
}

/// Size of the whole delivery log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryTotals {
    /// Records of any status.
    pub total: i64,
    /// Records in `read` status.
    pub read: i64,
}

/// Alert persistence.
#[async_trait]
pub trait AlertStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find an alert by ID.
    async fn find_alert(&self, id: Uuid) -> AppResult<Option<Alert>>;

    /// Persist a new alert.
    async fn insert_alert(&self, alert: &Alert) -> AppResult<Alert>;

    /// Set archived and clear active. Returns `None` for an unknown ID.
    async fn archive_alert(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Alert>>;

    /// Set `is_active` on an unarchived alert. Returns `None` if the alert
    /// is unknown or archived.
    async fn set_alert_active(
        &self,
        id: Uuid,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Alert>>;

    /// Active, unarchived, reminder-enabled alerts with `start <= now < expiry`.
    async fn find_reminder_candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<Alert>>;

    /// Live in-window alerts addressed to `user`, Critical first, then newest.
    async fn find_visible_alerts(&self, user: &User, now: DateTime<Utc>) -> AppResult<Vec<Alert>>;

    /// All alerts, newest first.
    async fn list_alerts(&self) -> AppResult<Vec<Alert>>;

    /// Total, active and expired counts of unarchived alerts at `now`.
    async fn count_alerts(&self, now: DateTime<Utc>) -> AppResult<AlertCounts>;

    /// Unarchived alerts grouped by `dimension`, ordered by label.
    async fn count_alerts_by(&self, dimension: AlertDimension) -> AppResult<Vec<LabelCount>>;

    /// Unarchived alerts created at or after `since`, per local day in
    /// `offset`. Days without alerts are omitted.
    async fn count_alerts_created_per_day(
        &self,
        since: DateTime<Utc>,
        offset: FixedOffset,
    ) -> AppResult<Vec<DailyCount>>;
}

/// Read access to users and teams, plus inserts for seeding.
#[async_trait]
pub trait DirectoryStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by ID.
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by username.
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Active users belonging to `organization`.
    async fn active_users_in_organization(&self, organization: &str) -> AppResult<Vec<User>>;

    /// Active users whose team is one of `team_ids`.
    async fn active_users_in_teams(&self, team_ids: &[Uuid]) -> AppResult<Vec<User>>;

    /// Active users among `user_ids`.
    async fn active_users_by_ids(&self, user_ids: &[Uuid]) -> AppResult<Vec<User>>;

    /// Find a team by organization and name.
    async fn find_team_by_name(&self, organization: &str, name: &str) -> AppResult<Option<Team>>;

    /// Persist a user.
    async fn insert_user(&self, user: &User) -> AppResult<User>;

    /// Persist a team.
    async fn insert_team(&self, team: &Team) -> AppResult<Team>;
}

/// Per-(user, alert) preference rows.
#[async_trait]
pub trait PreferenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the row for the pair, creating the zero-state row if absent.
    ///
    /// Concurrent callers for the same pair observe the same row.
    async fn get_or_create_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<DeliveryPreference>;

    /// Find the row for the pair without creating it.
    async fn find_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
    ) -> AppResult<Option<DeliveryPreference>>;

    /// Set `last_reminder_sent_at` on the pair's row, leaving read and
    /// snooze state as stored. Returns `None` if the row does not exist.
    async fn stamp_reminder_sent(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>>;

    /// Set or clear the read columns of the pair's row only.
    async fn set_read_state(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        is_read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>>;

    /// Set the snooze columns of the pair's row only.
    async fn snooze_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>>;

    /// Rows of `user_id` whose snooze is live at `now`.
    async fn find_snoozed_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DeliveryPreference>>;

    /// Clear every snooze with `snooze_until < now` in one conditional update.
    async fn reset_expired_snoozes(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Rows of `alert_id` whose snooze is live at `now`.
    async fn count_snoozed_for_alert(&self, alert_id: Uuid, now: DateTime<Utc>) -> AppResult<i64>;

    /// Rows of any alert whose snooze is live at `now`.
    async fn count_snoozed(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

/// Append-mostly delivery log.
#[async_trait]
pub trait DeliveryStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append a record.
    async fn insert_delivery(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord>;

    /// Move every `sent` record of the pair to `read`. Returns rows changed.
    async fn mark_deliveries_read(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Records of one alert, oldest first.
    async fn find_deliveries_for_alert(&self, alert_id: Uuid) -> AppResult<Vec<DeliveryRecord>>;

    /// Record counts per status for one alert.
    async fn status_breakdown(&self, alert_id: Uuid) -> AppResult<Vec<StatusCount>>;

    /// Totals over every alert's records.
    async fn delivery_totals(&self) -> AppResult<DeliveryTotals>;
}

/// Shared handles to every store, as wired at startup.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Alerts.
    pub alerts: Arc<dyn AlertStore>,
    /// Users and teams.
    pub directory: Arc<dyn DirectoryStore>,
    /// Preferences.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Delivery log.
    pub deliveries: Arc<dyn DeliveryStore>,
}

impl Stores {
    /// Wire all four stores to one backend.
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: AlertStore + DirectoryStore + PreferenceStore + DeliveryStore,
    {
        Self {
            alerts: backend.clone(),
            directory: backend.clone(),
            preferences: backend.clone(),
            deliveries: backend,
        }
    }
}
