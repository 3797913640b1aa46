//! Inbox queries and user actions on alerts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::{AlertStore, DirectoryStore};
use alerthub_entity::alert::Alert;
use alerthub_entity::preference::DeliveryPreference;
use alerthub_entity::user::User;

use crate::preference::PreferenceService;

/// An alert as seen by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxEntry {
    /// The alert.
    pub alert: Alert,
    /// Whether this user has read it.
    pub is_read: bool,
    /// Whether this user's snooze is live.
    pub is_snoozed: bool,
    /// When that snooze lapses.
    pub snooze_until: Option<DateTime<Utc>>,
}

/// An alert the user has snoozed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnoozedAlert {
    /// The alert.
    pub alert: Alert,
    /// When the snooze was requested.
    pub snoozed_at: Option<DateTime<Utc>>,
    /// When it lapses.
    pub snooze_until: Option<DateTime<Utc>>,
}

/// Per-user alert listing and read/snooze actions.
#[derive(Debug, Clone)]
pub struct InboxService {
    alerts: Arc<dyn AlertStore>,
    directory: Arc<dyn DirectoryStore>,
    preferences: PreferenceService,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl InboxService {
    /// Creates a new inbox service.
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        directory: Arc<dyn DirectoryStore>,
        preferences: PreferenceService,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            alerts,
            directory,
            preferences,
            clock,
            store_timeout,
        }
    }

    /// Live alerts addressed to the user, Critical first, then newest.
    pub async fn visible_alerts(&self, user_id: Uuid) -> AppResult<Vec<InboxEntry>> {
        let user = self.user(user_id).await?;
        let now = self.clock.now();
        let alerts = bounded(
            "list visible alerts",
            self.store_timeout,
            self.alerts.find_visible_alerts(&user, now),
        )
        .await?;

        let mut entries = Vec::with_capacity(alerts.len());
        for alert in alerts {
            let pref = self.preferences.find(user.id, alert.id).await?;
            entries.push(InboxEntry {
                is_read: pref.as_ref().is_some_and(|p| p.is_read),
                is_snoozed: pref.as_ref().is_some_and(|p| p.is_snoozed_at(now)),
                snooze_until: pref.and_then(|p| p.snooze_until),
                alert,
            });
        }
        Ok(entries)
    }

    /// Alerts the user has a live snooze on.
    pub async fn snoozed_alerts(&self, user_id: Uuid) -> AppResult<Vec<SnoozedAlert>> {
        let prefs = self.preferences.snoozed_for_user(user_id).await?;

        let mut snoozed = Vec::with_capacity(prefs.len());
        for pref in prefs {
            let alert = self.alert(pref.alert_id).await?;
            snoozed.push(SnoozedAlert {
                alert,
                snoozed_at: pref.snoozed_at,
                snooze_until: pref.snooze_until,
            });
        }
        Ok(snoozed)
    }

    /// Mark an alert read for the user.
    pub async fn mark_read(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        self.alert(alert_id).await?;
        self.preferences.mark_read(user_id, alert_id).await
    }

    /// Mark an alert unread for the user.
    pub async fn mark_unread(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        self.alert(alert_id).await?;
        self.preferences.mark_unread(user_id, alert_id).await
    }

    /// Snooze an alert for the rest of the user's day.
    pub async fn snooze(&self, user_id: Uuid, alert_id: Uuid) -> AppResult<DeliveryPreference> {
        self.alert(alert_id).await?;
        self.preferences.snooze_until_end_of_day(user_id, alert_id).await
    }

    async fn user(&self, user_id: Uuid) -> AppResult<User> {
        bounded(
            "find user",
            self.store_timeout,
            self.directory.find_user(user_id),
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    async fn alert(&self, alert_id: Uuid) -> AppResult<Alert> {
        bounded(
            "find alert",
            self.store_timeout,
            self.alerts.find_alert(alert_id),
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))
    }
}
