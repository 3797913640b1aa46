//! Outcomes of per-user and per-alert sends.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_entity::alert::DeliveryChannel;

/// Why a user was not (successfully) sent an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendReason {
    /// The user's snooze is live.
    Snoozed,
    /// The reminder cadence has not elapsed.
    TooSoon,
    /// The transport failed or timed out.
    DispatchFailed,
    /// The store failed or timed out.
    StoreUnavailable,
}

impl SendReason {
    /// Reason as reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snoozed => "snoozed",
            Self::TooSoon => "too_soon",
            Self::DispatchFailed => "dispatch_failed",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl fmt::Display for SendReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of sending one alert to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSendOutcome {
    /// Recipient.
    pub user_id: Uuid,
    /// Recipient's username.
    pub username: String,
    /// Whether the alert reached the user.
    pub success: bool,
    /// Channel used or that would have been used.
    pub channel: DeliveryChannel,
    /// When the dispatch completed, if one happened.
    pub sent_at: Option<DateTime<Utc>>,
    /// Why the send was skipped or failed.
    pub reason: Option<SendReason>,
    /// Error text for dispatch and store failures.
    pub error: Option<String>,
}

impl UserSendOutcome {
    /// Whether this outcome counts as a failure in the report.
    pub fn is_failure(&self) -> bool {
        matches!(
            self.reason,
            Some(SendReason::DispatchFailed | SendReason::StoreUnavailable)
        )
    }
}

/// Aggregate result of sending one alert to its whole audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSendReport {
    /// The alert.
    pub alert_id: Uuid,
    /// Its title.
    pub title: String,
    /// Whether this was a reminder pass.
    pub is_reminder: bool,
    /// Size of the resolved audience.
    pub total: usize,
    /// Users reached.
    pub sent: usize,
    /// Users whose dispatch or store write failed.
    pub failed: usize,
    /// Users skipped because of a live snooze.
    pub snoozed: usize,
    /// Users skipped because the cadence had not elapsed.
    pub skipped: usize,
    /// One entry per resolved user.
    pub details: Vec<UserSendOutcome>,
}

impl AlertSendReport {
    /// Empty report for an audience of `total` users.
    pub fn new(alert_id: Uuid, title: impl Into<String>, is_reminder: bool, total: usize) -> Self {
        Self {
            alert_id,
            title: title.into(),
            is_reminder,
            total,
            sent: 0,
            failed: 0,
            snoozed: 0,
            skipped: 0,
            details: Vec::with_capacity(total),
        }
    }

    /// Count `outcome` in its bucket and keep it as detail.
    pub fn record(&mut self, outcome: UserSendOutcome) {
        match outcome.reason {
            None if outcome.success => self.sent += 1,
            Some(SendReason::Snoozed) => self.snoozed += 1,
            Some(SendReason::TooSoon) => self.skipped += 1,
            _ => self.failed += 1,
        }
        self.details.push(outcome);
    }
}

/// Why an alert was not sent at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSkipReason {
    /// Inactive or archived.
    NotActive,
    /// Reminders disabled or outside the active window.
    NotEligible,
}

impl fmt::Display for AlertSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotActive => write!(f, "Alert not active"),
            Self::NotEligible => write!(f, "Alert not eligible for sending"),
        }
    }
}

/// Result of a send request for one alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SendAlertResult {
    /// The audience was processed.
    Delivered(AlertSendReport),
    /// Nothing was sent.
    Skipped {
        /// The alert.
        alert_id: Uuid,
        /// Why.
        reason: AlertSkipReason,
    },
}

impl SendAlertResult {
    /// The report, if the audience was processed.
    pub fn report(&self) -> Option<&AlertSendReport> {
        match self {
            Self::Delivered(report) => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}
