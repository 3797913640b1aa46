//! In-memory implementation of every store trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_entity::alert::{Alert, Visibility};
use alerthub_entity::delivery::{DeliveryRecord, DeliveryStatus};
use alerthub_entity::preference::DeliveryPreference;
use alerthub_entity::team::Team;
use alerthub_entity::user::User;

use crate::store::{
    AlertCounts, AlertDimension, AlertStore, DailyCount, DeliveryStore, DeliveryTotals,
    DirectoryStore, LabelCount, PreferenceStore, StatusCount,
};

/// All tables behind one lock.
#[derive(Debug, Default)]
struct Tables {
    alerts: HashMap<Uuid, Alert>,
    users: HashMap<Uuid, User>,
    teams: HashMap<Uuid, Team>,
    preferences: HashMap<(Uuid, Uuid), DeliveryPreference>,
    deliveries: Vec<DeliveryRecord>,
}

/// In-memory store guarded by a Tokio read-write lock.
///
/// Get-or-create and the snooze reset run under the write lock, so each is
/// a single atomic step. Suitable for single-node deployments only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    reads_fail: Arc<AtomicBool>,
    writes_fail: Arc<AtomicBool>,
    delivery_log_fails: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads and/or writes fail with a database error.
    pub fn simulate_outage(&self, reads: bool, writes: bool) {
        self.reads_fail.store(reads, Ordering::SeqCst);
        self.writes_fail.store(writes, Ordering::SeqCst);
    }

    /// Make subsequent delivery-log inserts fail while other writes succeed.
    pub fn simulate_delivery_log_outage(&self, fail: bool) {
        self.delivery_log_fails.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every preference row.
    pub async fn preferences(&self) -> Vec<DeliveryPreference> {
        self.tables.read().await.preferences.values().cloned().collect()
    }

    /// Snapshot of the delivery log.
    pub async fn deliveries(&self) -> Vec<DeliveryRecord> {
        self.tables.read().await.deliveries.clone()
    }

    /// Insert or replace a preference row as-is.
    pub async fn put_preference(&self, pref: DeliveryPreference) {
        self.tables
            .write()
            .await
            .preferences
            .insert((pref.user_id, pref.alert_id), pref);
    }

    /// Insert or replace an alert as-is.
    pub async fn put_alert(&self, alert: Alert) {
        self.tables.write().await.alerts.insert(alert.id, alert);
    }

    /// Replace the stored user with the same ID.
    pub async fn put_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id, user);
    }

    /// Apply `change` to the stored row in place, under the write lock.
    async fn update_preference<F>(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        change: F,
    ) -> AppResult<Option<DeliveryPreference>>
    where
        F: FnOnce(&mut DeliveryPreference) + Send,
    {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        Ok(tables.preferences.get_mut(&(user_id, alert_id)).map(|pref| {
            change(pref);
            pref.clone()
        }))
    }

    fn check_read(&self) -> AppResult<()> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(AppError::database("Memory store unavailable for reads"));
        }
        Ok(())
    }

    fn check_write(&self) -> AppResult<()> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(AppError::database("Memory store unavailable for writes"));
        }
        Ok(())
    }
}

fn sorted_by_username(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.username.cmp(&b.username));
    users
}

fn addressed_to(alert: &Alert, user: &User) -> bool {
    match alert.visibility {
        Visibility::Organization => alert.target_organization.as_deref() == Some(user.organization.as_str()),
        Visibility::Team => user
            .team_id
            .is_some_and(|team| alert.target_team_ids.contains(&team)),
        Visibility::User => alert.target_user_ids.contains(&user.id),
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn find_alert(&self, id: Uuid) -> AppResult<Option<Alert>> {
        self.check_read()?;
        Ok(self.tables.read().await.alerts.get(&id).cloned())
    }

    async fn insert_alert(&self, alert: &Alert) -> AppResult<Alert> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        if tables.alerts.contains_key(&alert.id) {
            return Err(AppError::conflict(format!("Alert {} already exists", alert.id)));
        }
        tables.alerts.insert(alert.id, alert.clone());
        Ok(alert.clone())
    }

    async fn archive_alert(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Alert>> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        Ok(tables.alerts.get_mut(&id).map(|alert| {
            alert.is_archived = true;
            alert.is_active = false;
            alert.updated_at = now;
            alert.clone()
        }))
    }

    async fn set_alert_active(
        &self,
        id: Uuid,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Alert>> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .alerts
            .get_mut(&id)
            .filter(|alert| !alert.is_archived)
            .map(|alert| {
                alert.is_active = is_active;
                alert.updated_at = now;
                alert.clone()
            }))
    }

    async fn find_reminder_candidates(&self, now: DateTime<Utc>) -> AppResult<Vec<Alert>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .alerts
            .values()
            .filter(|a| a.is_live() && a.reminder_enabled && a.is_within_window(now))
            .cloned()
            .collect())
    }

    async fn find_visible_alerts(&self, user: &User, now: DateTime<Utc>) -> AppResult<Vec<Alert>> {
        self.check_read()?;
        let mut alerts: Vec<Alert> = self
            .tables
            .read()
            .await
            .alerts
            .values()
            .filter(|a| a.is_live() && a.is_within_window(now) && addressed_to(a, user))
            .cloned()
            .collect();
        alerts.sort_by(|a, b| {
            b.severity
                .rank()
                .cmp(&a.severity.rank())
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(alerts)
    }

    async fn list_alerts(&self) -> AppResult<Vec<Alert>> {
        self.check_read()?;
        let mut alerts: Vec<Alert> = self.tables.read().await.alerts.values().cloned().collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn count_alerts(&self, now: DateTime<Utc>) -> AppResult<AlertCounts> {
        self.check_read()?;
        let tables = self.tables.read().await;
        let mut counts = AlertCounts::default();
        for alert in tables.alerts.values().filter(|a| !a.is_archived) {
            counts.total += 1;
            if alert.is_expired_at(now) {
                counts.expired += 1;
            } else if alert.is_active {
                counts.active += 1;
            }
        }
        Ok(counts)
    }

    async fn count_alerts_by(&self, dimension: AlertDimension) -> AppResult<Vec<LabelCount>> {
        self.check_read()?;
        let tables = self.tables.read().await;
        let mut counts: HashMap<&'static str, i64> = HashMap::new();
        for alert in tables.alerts.values().filter(|a| !a.is_archived) {
            *counts.entry(dimension.label_of(alert)).or_default() += 1;
        }
        let mut grouped: Vec<LabelCount> = counts
            .into_iter()
            .map(|(label, count)| LabelCount {
                label: label.to_string(),
                count,
            })
            .collect();
        grouped.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(grouped)
    }

    async fn count_alerts_created_per_day(
        &self,
        since: DateTime<Utc>,
        offset: FixedOffset,
    ) -> AppResult<Vec<DailyCount>> {
        self.check_read()?;
        let tables = self.tables.read().await;
        let mut counts: HashMap<NaiveDate, i64> = HashMap::new();
        for alert in tables
            .alerts
            .values()
            .filter(|a| !a.is_archived && a.created_at >= since)
        {
            let day = alert.created_at.with_timezone(&offset).date_naive();
            *counts.entry(day).or_default() += 1;
        }
        let mut days: Vec<DailyCount> = counts
            .into_iter()
            .map(|(day, count)| DailyCount { day, count })
            .collect();
        days.sort_by_key(|d| d.day);
        Ok(days)
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        self.check_read()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn active_users_in_organization(&self, organization: &str) -> AppResult<Vec<User>> {
        self.check_read()?;
        let tables = self.tables.read().await;
        Ok(sorted_by_username(
            tables
                .users
                .values()
                .filter(|u| u.is_active && u.organization == organization)
                .cloned()
                .collect(),
        ))
    }

    async fn active_users_in_teams(&self, team_ids: &[Uuid]) -> AppResult<Vec<User>> {
        self.check_read()?;
        let tables = self.tables.read().await;
        Ok(sorted_by_username(
            tables
                .users
                .values()
                .filter(|u| u.is_active && u.team_id.is_some_and(|t| team_ids.contains(&t)))
                .cloned()
                .collect(),
        ))
    }

    async fn active_users_by_ids(&self, user_ids: &[Uuid]) -> AppResult<Vec<User>> {
        self.check_read()?;
        let tables = self.tables.read().await;
        Ok(sorted_by_username(
            tables
                .users
                .values()
                .filter(|u| u.is_active && user_ids.contains(&u.id))
                .cloned()
                .collect(),
        ))
    }

    async fn find_team_by_name(&self, organization: &str, name: &str) -> AppResult<Option<Team>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .teams
            .values()
            .find(|t| t.organization == organization && t.name == name)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> AppResult<User> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn insert_team(&self, team: &Team) -> AppResult<Team> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        if tables
            .teams
            .values()
            .any(|t| t.organization == team.organization && t.name == team.name)
        {
            return Err(AppError::conflict(format!(
                "Team '{}' already exists in {}",
                team.name, team.organization
            )));
        }
        tables.teams.insert(team.id, team.clone());
        Ok(team.clone())
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get_or_create_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<DeliveryPreference> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .preferences
            .entry((user_id, alert_id))
            .or_insert_with(|| DeliveryPreference::new(user_id, alert_id, now))
            .clone())
    }

    async fn find_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
    ) -> AppResult<Option<DeliveryPreference>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .preferences
            .get(&(user_id, alert_id))
            .cloned())
    }

    async fn stamp_reminder_sent(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>> {
        self.update_preference(user_id, alert_id, |pref| pref.record_send(now))
            .await
    }

    async fn set_read_state(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        is_read: bool,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>> {
        self.update_preference(user_id, alert_id, |pref| {
            if is_read {
                pref.mark_read(now);
            } else {
                pref.mark_unread(now);
            }
        })
        .await
    }

    async fn snooze_preference(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DeliveryPreference>> {
        self.update_preference(user_id, alert_id, |pref| pref.snooze(until, now))
            .await
    }

    async fn find_snoozed_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DeliveryPreference>> {
        self.check_read()?;
        let mut prefs: Vec<DeliveryPreference> = self
            .tables
            .read()
            .await
            .preferences
            .values()
            .filter(|p| p.user_id == user_id && p.is_snoozed_at(now))
            .cloned()
            .collect();
        prefs.sort_by_key(|p| p.snooze_until);
        Ok(prefs)
    }

    async fn reset_expired_snoozes(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        let mut cleared = 0;
        for pref in tables.preferences.values_mut() {
            if pref.is_snoozed && pref.snooze_until.is_some_and(|until| until < now) {
                pref.is_snoozed = false;
                pref.snooze_until = None;
                pref.updated_at = now;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn count_snoozed_for_alert(&self, alert_id: Uuid, now: DateTime<Utc>) -> AppResult<i64> {
        self.check_read()?;
        let count = self
            .tables
            .read()
            .await
            .preferences
            .values()
            .filter(|p| p.alert_id == alert_id && p.is_snoozed_at(now))
            .count();
        Ok(count as i64)
    }

    async fn count_snoozed(&self, now: DateTime<Utc>) -> AppResult<i64> {
        self.check_read()?;
        let count = self
            .tables
            .read()
            .await
            .preferences
            .values()
            .filter(|p| p.is_snoozed_at(now))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn insert_delivery(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord> {
        self.check_write()?;
        if self.delivery_log_fails.load(Ordering::SeqCst) {
            return Err(AppError::database("Delivery log unavailable"));
        }
        self.tables.write().await.deliveries.push(record.clone());
        Ok(record.clone())
    }

    async fn mark_deliveries_read(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.check_write()?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for record in tables
            .deliveries
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.alert_id == alert_id)
        {
            if record.status.can_transition_to(DeliveryStatus::Read) {
                record.status = DeliveryStatus::Read;
                record.read_at = Some(now);
                record.updated_at = now;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn find_deliveries_for_alert(&self, alert_id: Uuid) -> AppResult<Vec<DeliveryRecord>> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .deliveries
            .iter()
            .filter(|r| r.alert_id == alert_id)
            .cloned()
            .collect())
    }

    async fn status_breakdown(&self, alert_id: Uuid) -> AppResult<Vec<StatusCount>> {
        self.check_read()?;
        let tables = self.tables.read().await;
        let mut counts: HashMap<DeliveryStatus, i64> = HashMap::new();
        for record in tables.deliveries.iter().filter(|r| r.alert_id == alert_id) {
            *counts.entry(record.status).or_default() += 1;
        }
        let mut breakdown: Vec<StatusCount> = counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();
        breakdown.sort_by_key(|c| c.status.as_str());
        Ok(breakdown)
    }

    async fn delivery_totals(&self) -> AppResult<DeliveryTotals> {
        self.check_read()?;
        let tables = self.tables.read().await;
        Ok(DeliveryTotals {
            total: tables.deliveries.len() as i64,
            read: tables
                .deliveries
                .iter()
                .filter(|r| r.status == DeliveryStatus::Read)
                .count() as i64,
        })
    }
}
