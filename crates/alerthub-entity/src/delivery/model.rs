//! Delivery record entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::alert::DeliveryChannel;

use super::status::DeliveryStatus;

/// One send attempt of an alert to a user. Append-mostly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeliveryRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// The alert that was sent.
    pub alert_id: Uuid,
    /// The recipient.
    pub user_id: Uuid,
    /// Channel used.
    pub channel: DeliveryChannel,
    /// Current status.
    pub status: DeliveryStatus,
    /// When the transport accepted the message.
    pub sent_at: Option<DateTime<Utc>>,
    /// When the recipient read it.
    pub read_at: Option<DateTime<Utc>>,
    /// Transport error, for failed attempts.
    pub failure_reason: Option<String>,
    /// Whether this attempt was a reminder.
    pub is_reminder: bool,
    /// Reminder occurrence count carried by this attempt.
    pub reminder_count: i32,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DeliveryRecord {
    /// A successful attempt.
    pub fn sent(
        alert_id: Uuid,
        user_id: Uuid,
        channel: DeliveryChannel,
        is_reminder: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            alert_id,
            user_id,
            channel,
            status: DeliveryStatus::Sent,
            sent_at: Some(now),
            read_at: None,
            failure_reason: None,
            is_reminder,
            reminder_count: if is_reminder { 1 } else { 0 },
            created_at: now,
            updated_at: now,
        }
    }

    /// A failed attempt.
    pub fn failed(
        alert_id: Uuid,
        user_id: Uuid,
        channel: DeliveryChannel,
        is_reminder: bool,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            sent_at: None,
            failure_reason: Some(reason.into()),
            ..Self::sent(alert_id, user_id, channel, is_reminder, now)
        }
    }
}
