//! Send orchestration: eligibility, dispatch, and bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_core::timeout::bounded;
use alerthub_database::store::{AlertStore, DeliveryStore};
use alerthub_entity::alert::Alert;
use alerthub_entity::delivery::DeliveryRecord;
use alerthub_entity::user::User;

use crate::audience::AudienceResolver;
use crate::dispatch::{ChannelDispatcher, DeliveryOutcome};
use crate::preference::PreferenceService;

use super::report::{AlertSendReport, AlertSkipReason, SendAlertResult, SendReason, UserSendOutcome};

/// Sends alerts to their audiences and records what happened.
#[derive(Debug, Clone)]
pub struct SendOrchestrator {
    alerts: Arc<dyn AlertStore>,
    deliveries: Arc<dyn DeliveryStore>,
    resolver: AudienceResolver,
    preferences: PreferenceService,
    dispatcher: ChannelDispatcher,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl SendOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        deliveries: Arc<dyn DeliveryStore>,
        resolver: AudienceResolver,
        preferences: PreferenceService,
        dispatcher: ChannelDispatcher,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            alerts,
            deliveries,
            resolver,
            preferences,
            dispatcher,
            clock,
            store_timeout,
        }
    }

    /// Send `alert` to one user.
    ///
    /// Reminders are skipped while the user's snooze is live or the cadence
    /// has not elapsed; neither skip dispatches or records anything. Store
    /// failures before dispatch end this user's send and are reported, never
    /// propagated.
    pub async fn send_to_user(&self, alert: &Alert, user: &User, is_reminder: bool) -> UserSendOutcome {
        match self.try_send_to_user(alert, user, is_reminder).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    alert_id = %alert.id,
                    user_id = %user.id,
                    error = %e,
                    "Store failure while sending alert"
                );
                UserSendOutcome {
                    user_id: user.id,
                    username: user.username.clone(),
                    success: false,
                    channel: alert.delivery_channel,
                    sent_at: None,
                    reason: Some(SendReason::StoreUnavailable),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_send_to_user(
        &self,
        alert: &Alert,
        user: &User,
        is_reminder: bool,
    ) -> AppResult<UserSendOutcome> {
        let pref = self.preferences.get_or_create(user.id, alert.id).await?;

        let skip = |reason: SendReason| UserSendOutcome {
            user_id: user.id,
            username: user.username.clone(),
            success: false,
            channel: alert.delivery_channel,
            sent_at: None,
            reason: Some(reason),
            error: None,
        };

        if is_reminder && self.preferences.is_snoozed_now(&pref) {
            debug!(alert_id = %alert.id, user_id = %user.id, "Skipping snoozed user");
            return Ok(skip(SendReason::Snoozed));
        }

        if is_reminder
            && !self
                .preferences
                .should_receive_reminder(&pref, alert.reminder_frequency())
        {
            debug!(alert_id = %alert.id, user_id = %user.id, "Reminder not due yet");
            return Ok(skip(SendReason::TooSoon));
        }

        let outcome = self
            .dispatcher
            .send(alert.delivery_channel, user, alert)
            .await;

        if outcome.success {
            self.record_success(alert, user, is_reminder, &outcome).await;
        } else {
            let reason = outcome.error.clone().unwrap_or_default();
            let record = DeliveryRecord::failed(
                alert.id,
                user.id,
                outcome.channel,
                is_reminder,
                reason,
                outcome.sent_at,
            );
            self.insert_record(&record).await?;
        }

        Ok(UserSendOutcome {
            user_id: user.id,
            username: user.username.clone(),
            success: outcome.success,
            channel: outcome.channel,
            sent_at: outcome.success.then_some(outcome.sent_at),
            reason: (!outcome.success).then_some(SendReason::DispatchFailed),
            error: outcome.error,
        })
    }

    /// Send an alert to its whole audience.
    ///
    /// Fails with `NotFound` for an unknown alert. An alert that is not live
    /// or fails the reminder gate is skipped, for first sends too.
    /// Non-reminder sends are not deduplicated: each call re-sends.
    pub async fn send_alert(&self, alert_id: Uuid, is_reminder: bool) -> AppResult<SendAlertResult> {
        let alert = bounded(
            "find alert",
            self.store_timeout,
            self.alerts.find_alert(alert_id),
        )
        .await?
        .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))?;

        self.send_loaded_alert(&alert, is_reminder).await
    }

    /// Like [`send_alert`](Self::send_alert) for an alert already in hand.
    pub async fn send_loaded_alert(&self, alert: &Alert, is_reminder: bool) -> AppResult<SendAlertResult> {
        if !alert.is_live() {
            warn!(alert_id = %alert.id, "Alert not active, nothing sent");
            return Ok(SendAlertResult::Skipped {
                alert_id: alert.id,
                reason: AlertSkipReason::NotActive,
            });
        }

        if !alert.should_send_reminder(self.clock.now()) {
            warn!(
                alert_id = %alert.id,
                reminder_enabled = alert.reminder_enabled,
                "Alert outside its window or reminders disabled, nothing sent"
            );
            return Ok(SendAlertResult::Skipped {
                alert_id: alert.id,
                reason: AlertSkipReason::NotEligible,
            });
        }

        let audience = self.resolver.resolve(alert).await?;
        let mut report = AlertSendReport::new(alert.id, alert.title.clone(), is_reminder, audience.len());

        for user in &audience {
            let outcome = self.send_to_user(alert, user, is_reminder).await;
            report.record(outcome);
        }

        info!(
            alert_id = %alert.id,
            is_reminder,
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            snoozed = report.snoozed,
            skipped = report.skipped,
            "Alert send finished"
        );

        Ok(SendAlertResult::Delivered(report))
    }

    /// Bookkeeping after a successful dispatch.
    ///
    /// The user has been reached, so failures here are logged and the send
    /// still counts as delivered. The reminder stamp goes first so the
    /// cadence holds even when the delivery log is unavailable.
    async fn record_success(
        &self,
        alert: &Alert,
        user: &User,
        is_reminder: bool,
        outcome: &DeliveryOutcome,
    ) {
        if let Err(e) = self.preferences.record_send(user.id, alert.id).await {
            error!(
                alert_id = %alert.id,
                user_id = %user.id,
                error = %e,
                "Alert delivered but reminder stamp not stored"
            );
        }

        let record = DeliveryRecord::sent(
            alert.id,
            user.id,
            outcome.channel,
            is_reminder,
            outcome.sent_at,
        );
        if let Err(e) = self.insert_record(&record).await {
            error!(
                alert_id = %alert.id,
                user_id = %user.id,
                error = %e,
                "Alert delivered but delivery record not stored"
            );
        }
    }

    async fn insert_record(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord> {
        bounded(
            "record delivery",
            self.store_timeout,
            self.deliveries.insert_delivery(record),
        )
        .await
    }
}
