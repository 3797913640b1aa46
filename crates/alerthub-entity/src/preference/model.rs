//! Delivery preference entity.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Read, snooze, and reminder state of one user for one alert.
///
/// At most one row exists per `(user_id, alert_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeliveryPreference {
    /// Unique row identifier.
    pub id: Uuid,
    /// The user.
    pub user_id: Uuid,
    /// The alert.
    pub alert_id: Uuid,
    /// Whether the user has read the alert.
    pub is_read: bool,
    /// When the alert was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Whether a snooze was requested.
    pub is_snoozed: bool,
    /// When the snooze was requested.
    pub snoozed_at: Option<DateTime<Utc>>,
    /// When the snooze lapses.
    pub snooze_until: Option<DateTime<Utc>>,
    /// When the last successful send to this user happened.
    pub last_reminder_sent_at: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DeliveryPreference {
    /// Zero state: not read, not snoozed, never reminded.
    pub fn new(user_id: Uuid, alert_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            alert_id,
            is_read: false,
            read_at: None,
            is_snoozed: false,
            snoozed_at: None,
            snooze_until: None,
            last_reminder_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A snooze is live only while its expiry is strictly in the future.
    ///
    /// The flag alone is not authoritative; expired snoozes are cleared
    /// lazily by the reset sweep.
    pub fn is_snoozed_at(&self, now: DateTime<Utc>) -> bool {
        self.is_snoozed && self.snooze_until.is_some_and(|until| until > now)
    }

    /// Whether a reminder may go out at `now` given the alert's cadence.
    pub fn should_receive_reminder_at(&self, frequency: Duration, now: DateTime<Utc>) -> bool {
        if self.is_snoozed_at(now) {
            return false;
        }

        match self.last_reminder_sent_at {
            None => true,
            Some(last) => now - last >= frequency,
        }
    }

    /// Mark the alert read.
    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.is_read = true;
        self.read_at = Some(now);
        self.updated_at = now;
    }

    /// Clear the read state.
    pub fn mark_unread(&mut self, now: DateTime<Utc>) {
        self.is_read = false;
        self.read_at = None;
        self.updated_at = now;
    }

    /// Snooze until `until`.
    pub fn snooze(&mut self, until: DateTime<Utc>, now: DateTime<Utc>) {
        self.is_snoozed = true;
        self.snoozed_at = Some(now);
        self.snooze_until = Some(until);
        self.updated_at = now;
    }

    /// Record a successful send.
    pub fn record_send(&mut self, now: DateTime<Utc>) {
        self.last_reminder_sent_at = Some(now);
        self.updated_at = now;
    }
}

/// 23:59:59.999999 of the local day containing `now`, expressed in UTC.
pub fn end_of_local_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let end = local
        .date_naive()
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .unwrap_or_else(|| local.naive_local());

    offset
        .from_local_datetime(&end)
        .single()
        .unwrap_or(local)
        .with_timezone(&Utc)
}
