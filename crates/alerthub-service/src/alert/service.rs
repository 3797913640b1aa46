//! Alert authoring, manual triggers, archiving, and statistics.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::{
    AlertDimension, AlertStore, DeliveryStore, LabelCount, PreferenceStore,
};
use alerthub_entity::alert::{Alert, NewAlert};

use crate::orchestrator::{SendAlertResult, SendOrchestrator};

use super::stats::{AlertStats, SystemOverview, SystemStats, fill_days};

/// Days covered by the creation histogram, today included.
const ACTIVITY_DAYS: u64 = 7;

/// Which unarchived alerts to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertListFilter {
    /// Every unarchived alert.
    #[default]
    All,
    /// Active and not yet expired.
    Active,
    /// Past their expiry time.
    Expired,
}

impl AlertListFilter {
    /// Parse from string, falling back to `All`.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "expired" => Self::Expired,
            _ => Self::All,
        }
    }
}

/// A newly created alert and the result of its immediate send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedAlert {
    /// The stored alert.
    pub alert: Alert,
    /// The initial, non-reminder send.
    pub delivery: SendAlertResult,
}

/// Alert lifecycle operations.
#[derive(Debug, Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertStore>,
    deliveries: Arc<dyn DeliveryStore>,
    preferences: Arc<dyn PreferenceStore>,
    orchestrator: SendOrchestrator,
    clock: Arc<dyn Clock>,
    /// Local zone for per-day activity.
    offset: FixedOffset,
    store_timeout: Duration,
}

impl AlertService {
    /// Creates a new alert service.
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        deliveries: Arc<dyn DeliveryStore>,
        preferences: Arc<dyn PreferenceStore>,
        orchestrator: SendOrchestrator,
        clock: Arc<dyn Clock>,
        offset: FixedOffset,
        store_timeout: Duration,
    ) -> Self {
        Self {
            alerts,
            deliveries,
            preferences,
            orchestrator,
            clock,
            offset,
            store_timeout,
        }
    }

    /// Validate and store a new alert, then send it immediately.
    pub async fn create_alert(&self, new: NewAlert, created_by: Option<Uuid>) -> AppResult<CreatedAlert> {
        let now = self.clock.now();
        new.check(now)?;

        let alert = Alert::from_new(new, created_by, now);
        let alert = bounded(
            "create alert",
            self.store_timeout,
            self.alerts.insert_alert(&alert),
        )
        .await?;

        info!(
            alert_id = %alert.id,
            severity = %alert.severity,
            visibility = %alert.visibility,
            channel = %alert.delivery_channel,
            "Alert created"
        );

        let delivery = self.orchestrator.send_loaded_alert(&alert, false).await?;
        Ok(CreatedAlert { alert, delivery })
    }

    /// Manually re-send an alert to its whole audience.
    pub async fn trigger_alert(&self, alert_id: Uuid) -> AppResult<SendAlertResult> {
        info!(%alert_id, "Alert triggered manually");
        self.orchestrator.send_alert(alert_id, false).await
    }

    /// Archive an alert; archived alerts are never sent again.
    pub async fn archive_alert(&self, alert_id: Uuid) -> AppResult<Alert> {
        let alert = bounded(
            "archive alert",
            self.store_timeout,
            self.alerts.archive_alert(alert_id, self.clock.now()),
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))?;

        info!(%alert_id, "Alert archived");
        Ok(alert)
    }

    /// Activate or deactivate an alert without archiving it.
    ///
    /// Inactive alerts are neither sent nor shown. Archived alerts cannot be
    /// toggled.
    pub async fn set_active(&self, alert_id: Uuid, is_active: bool) -> AppResult<Alert> {
        let alert = self.get_alert(alert_id).await?;
        if alert.is_archived {
            return Err(AppError::conflict(format!(
                "Alert {alert_id} is archived and cannot be {}",
                if is_active { "activated" } else { "deactivated" }
            )));
        }

        let alert = bounded(
            "set alert activation",
            self.store_timeout,
            self.alerts
                .set_alert_active(alert_id, is_active, self.clock.now()),
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))?;

        info!(%alert_id, is_active, "Alert activation changed");
        Ok(alert)
    }

    /// Fetch one alert.
    pub async fn get_alert(&self, alert_id: Uuid) -> AppResult<Alert> {
        bounded(
            "find alert",
            self.store_timeout,
            self.alerts.find_alert(alert_id),
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))
    }

    /// Unarchived alerts matching `filter`, newest first.
    pub async fn list_alerts(&self, filter: AlertListFilter) -> AppResult<Vec<Alert>> {
        let now = self.clock.now();
        let alerts = bounded("list alerts", self.store_timeout, self.alerts.list_alerts()).await?;

        Ok(alerts
            .into_iter()
            .filter(|a| !a.is_archived)
            .filter(|a| match filter {
                AlertListFilter::All => true,
                AlertListFilter::Active => a.is_active && !a.is_expired_at(now),
                AlertListFilter::Expired => a.is_expired_at(now),
            })
            .collect())
    }

    /// Delivery metrics for one alert.
    pub async fn alert_stats(&self, alert_id: Uuid) -> AppResult<AlertStats> {
        let alert = self.get_alert(alert_id).await?;

        let records = bounded(
            "list deliveries",
            self.store_timeout,
            self.deliveries.find_deliveries_for_alert(alert_id),
        )
        .await?;
        let snoozed = bounded(
            "count snoozed",
            self.store_timeout,
            self.preferences
                .count_snoozed_for_alert(alert_id, self.clock.now()),
        )
        .await?;
        let breakdown = bounded(
            "status breakdown",
            self.store_timeout,
            self.deliveries.status_breakdown(alert_id),
        )
        .await?;

        Ok(AlertStats::from_records(
            alert.id,
            alert.title,
            alert.severity,
            &records,
            snoozed,
            breakdown,
        ))
    }

    /// Totals, breakdowns, and the last week of alert creation.
    pub async fn system_stats(&self) -> AppResult<SystemStats> {
        let now = self.clock.now();

        let counts = bounded("count alerts", self.store_timeout, self.alerts.count_alerts(now)).await?;
        let deliveries = bounded(
            "total deliveries",
            self.store_timeout,
            self.deliveries.delivery_totals(),
        )
        .await?;
        let snoozed = bounded(
            "count snoozed",
            self.store_timeout,
            self.preferences.count_snoozed(now),
        )
        .await?;

        let by_severity = self.breakdown(AlertDimension::Severity).await?;
        let by_channel = self.breakdown(AlertDimension::DeliveryChannel).await?;
        let by_visibility = self.breakdown(AlertDimension::Visibility).await?;

        let today = now.with_timezone(&self.offset).date_naive();
        let first_day = today - ChronoDuration::days(ACTIVITY_DAYS as i64 - 1);
        let since = (first_day.and_time(NaiveTime::MIN)
            - ChronoDuration::seconds(i64::from(self.offset.local_minus_utc())))
        .and_utc();
        let observed = bounded(
            "count recent alerts",
            self.store_timeout,
            self.alerts.count_alerts_created_per_day(since, self.offset),
        )
        .await?;

        Ok(SystemStats {
            overview: SystemOverview::new(counts, deliveries, snoozed),
            by_severity,
            by_channel,
            by_visibility,
            recent_activity: fill_days(first_day.iter_days().take(ACTIVITY_DAYS as usize), &observed),
        })
    }

    async fn breakdown(&self, dimension: AlertDimension) -> AppResult<Vec<LabelCount>> {
        bounded(
            "group alerts",
            self.store_timeout,
            self.alerts.count_alerts_by(dimension),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use alerthub_core::error::ErrorKind;
    use alerthub_entity::alert::{AudienceScope, DeliveryChannel, Severity};

    fn new_alert(fx: &Fixture, scope: AudienceScope) -> NewAlert {
        NewAlert {
            title: "Office closed".to_string(),
            message: "The office is closed for maintenance".to_string(),
            severity: Severity::Warning,
            delivery_channel: DeliveryChannel::Email,
            scope,
            reminder_enabled: true,
            reminder_frequency_hours: 2,
            start_time: None,
            expiry_time: fx.now() + chrono::Duration::days(1),
        }
    }

    #[tokio::test]
    async fn test_create_sends_immediately() {
        let fx = Fixture::new().await;
        let user = fx.user("u1", "acme", None).await;

        let created = fx
            .alerts()
            .create_alert(
                new_alert(&fx, AudienceScope::User { user_ids: vec![user.id] }),
                None,
            )
            .await
            .unwrap();

        assert_eq!(created.alert.start_time, fx.now());
        assert_eq!(created.delivery.report().unwrap().sent, 1);
        assert_eq!(fx.store.deliveries().await[0].channel, DeliveryChannel::Email);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_targets() {
        let fx = Fixture::new().await;
        let err = fx
            .alerts()
            .create_alert(new_alert(&fx, AudienceScope::Team { team_ids: vec![] }), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_archive_stops_sends_and_listing() {
        let fx = Fixture::new().await;
        fx.user("u1", "acme", None).await;
        let alert = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;
        let service = fx.alerts();

        let archived = service.archive_alert(alert.id).await.unwrap();
        assert!(archived.is_archived);
        assert!(!archived.is_active);

        let result = service.trigger_alert(alert.id).await.unwrap();
        assert!(result.report().is_none());
        assert!(service.list_alerts(AlertListFilter::All).await.unwrap().is_empty());

        let err = service.archive_alert(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_filters_by_expiry() {
        let fx = Fixture::new().await;
        let live = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;
        let service = fx.alerts();

        assert_eq!(service.list_alerts(AlertListFilter::Active).await.unwrap().len(), 1);
        assert!(service.list_alerts(AlertListFilter::Expired).await.unwrap().is_empty());

        fx.clock.set(live.expiry_time);
        assert!(service.list_alerts(AlertListFilter::Active).await.unwrap().is_empty());
        assert_eq!(service.list_alerts(AlertListFilter::Expired).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_after_read_and_snooze() {
        let fx = Fixture::new().await;
        let u1 = fx.user("u1", "acme", None).await;
        let u2 = fx.user("u2", "acme", None).await;
        fx.user("u3", "acme", None).await;
        let alert = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;
        let service = fx.alerts();

        service.trigger_alert(alert.id).await.unwrap();
        fx.preferences().mark_read(u1.id, alert.id).await.unwrap();
        fx.preferences()
            .snooze_until_end_of_day(u2.id, alert.id)
            .await
            .unwrap();

        let stats = service.alert_stats(alert.id).await.unwrap();
        assert_eq!(stats.total_deliveries, 3);
        assert_eq!(stats.read_count, 1);
        assert_eq!(stats.snoozed_count, 1);
        assert_eq!(stats.reminder_count, 0);
        assert_eq!(stats.read_rate, 33.33);
        assert_eq!(stats.status_breakdown.len(), 2);
    }

    #[tokio::test]
    async fn test_deactivate_pauses_without_archiving() {
        let fx = Fixture::new().await;
        fx.user("u1", "acme", None).await;
        let alert = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;
        let service = fx.alerts();

        let paused = service.set_active(alert.id, false).await.unwrap();
        assert!(!paused.is_active);
        assert!(!paused.is_archived);
        assert!(service.trigger_alert(alert.id).await.unwrap().report().is_none());
        assert!(service.list_alerts(AlertListFilter::Active).await.unwrap().is_empty());
        assert_eq!(service.list_alerts(AlertListFilter::All).await.unwrap().len(), 1);

        service.set_active(alert.id, true).await.unwrap();
        let result = service.trigger_alert(alert.id).await.unwrap();
        assert_eq!(result.report().unwrap().sent, 1);
    }

    #[tokio::test]
    async fn test_archived_alert_cannot_be_reactivated() {
        let fx = Fixture::new().await;
        let alert = fx
            .alert(AudienceScope::Organization {
                organization: "acme".to_string(),
            })
            .await;
        let service = fx.alerts();
        service.archive_alert(alert.id).await.unwrap();

        let err = service.set_active(alert.id, true).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = service.set_active(Uuid::new_v4(), true).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_system_stats_overview_and_activity() {
        let fx = Fixture::new().await;
        let u1 = fx.user("u1", "acme", None).await;
        let u2 = fx.user("u2", "acme", None).await;
        let acme = || AudienceScope::Organization {
            organization: "acme".to_string(),
        };

        let fresh = fx.alert(acme()).await;

        let mut older = fx.alert(acme()).await;
        older.severity = Severity::Critical;
        older.created_at = fx.now() - chrono::Duration::days(3);
        fx.replace_alert(older).await;

        let mut expired = fx.alert(acme()).await;
        expired.created_at = fx.now() - chrono::Duration::days(10);
        expired.start_time = expired.created_at;
        expired.expiry_time = fx.now() - chrono::Duration::hours(1);
        fx.replace_alert(expired).await;

        let archived = fx.alert(acme()).await;
        let service = fx.alerts();
        service.archive_alert(archived.id).await.unwrap();

        service.trigger_alert(fresh.id).await.unwrap();
        fx.preferences().mark_read(u1.id, fresh.id).await.unwrap();
        fx.preferences()
            .snooze_until_end_of_day(u2.id, fresh.id)
            .await
            .unwrap();

        let stats = service.system_stats().await.unwrap();
        let o = &stats.overview;
        assert_eq!((o.total_alerts, o.active_alerts, o.expired_alerts), (3, 2, 1));
        assert_eq!((o.total_delivered, o.total_read, o.total_snoozed), (2, 1, 1));
        assert_eq!(o.read_rate, 50.0);

        let severity: Vec<(&str, i64)> = stats
            .by_severity
            .iter()
            .map(|c| (c.label.as_str(), c.count))
            .collect();
        assert_eq!(severity, vec![("Critical", 1), ("Warning", 2)]);
        assert_eq!(stats.by_visibility.len(), 1);
        assert_eq!(stats.by_visibility[0].count, 3);
        assert_eq!(stats.by_channel[0].label, "InApp");

        let activity: Vec<i64> = stats.recent_activity.iter().map(|d| d.count).collect();
        assert_eq!(activity, vec![0, 0, 0, 1, 0, 0, 1]);
        assert_eq!(
            stats.recent_activity[6].day,
            fx.now().date_naive()
        );
    }
}
