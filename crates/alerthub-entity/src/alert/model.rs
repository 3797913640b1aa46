//! Alert entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;

use super::channel::DeliveryChannel;
use super::severity::Severity;
use super::visibility::{AudienceScope, Visibility};

/// An alert addressed to an organization, a set of teams, or a set of users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: Uuid,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Urgency.
    pub severity: Severity,
    /// Medium used for every delivery of this alert.
    pub delivery_channel: DeliveryChannel,
    /// Which target field below is meaningful.
    pub visibility: Visibility,
    /// Target organization (Organization visibility).
    pub target_organization: Option<String>,
    /// Target teams (Team visibility).
    pub target_team_ids: Vec<Uuid>,
    /// Target users (User visibility).
    pub target_user_ids: Vec<Uuid>,
    /// Whether reminders are sent at all.
    pub reminder_enabled: bool,
    /// Minimum hours between two sends to the same user.
    pub reminder_frequency_hours: i32,
    /// Start of the active window (inclusive).
    pub start_time: DateTime<Utc>,
    /// End of the active window (exclusive).
    pub expiry_time: DateTime<Utc>,
    /// Whether the alert is switched on.
    pub is_active: bool,
    /// Whether the alert has been archived.
    pub is_archived: bool,
    /// The author of the alert.
    pub created_by: Option<Uuid>,
    /// When the alert was created.
    pub created_at: DateTime<Utc>,
    /// When the alert was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Build a fresh alert row from a validated definition.
    pub fn from_new(new: NewAlert, created_by: Option<Uuid>, now: DateTime<Utc>) -> Self {
        let visibility = new.scope.visibility();
        let (target_organization, target_team_ids, target_user_ids) = match new.scope {
            AudienceScope::Organization { organization } => (Some(organization), vec![], vec![]),
            AudienceScope::Team { team_ids } => (None, team_ids, vec![]),
            AudienceScope::User { user_ids } => (None, vec![], user_ids),
        };

        Self {
            id: Uuid::now_v7(),
            title: new.title,
            message: new.message,
            severity: new.severity,
            delivery_channel: new.delivery_channel,
            visibility,
            target_organization,
            target_team_ids,
            target_user_ids,
            reminder_enabled: new.reminder_enabled,
            reminder_frequency_hours: new.reminder_frequency_hours,
            start_time: new.start_time.unwrap_or(now),
            expiry_time: new.expiry_time,
            is_active: true,
            is_archived: false,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// The targeting rule with only its meaningful fields.
    ///
    /// An Organization alert without an organization is a configuration
    /// error, not an empty audience.
    pub fn scope(&self) -> AppResult<AudienceScope> {
        match self.visibility {
            Visibility::Organization => {
                let organization = self
                    .target_organization
                    .as_deref()
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .ok_or_else(|| {
                        AppError::configuration(format!(
                            "Alert {} has Organization visibility but no target organization",
                            self.id
                        ))
                    })?;
                Ok(AudienceScope::Organization {
                    organization: organization.to_string(),
                })
            }
            Visibility::Team => Ok(AudienceScope::Team {
                team_ids: self.target_team_ids.clone(),
            }),
            Visibility::User => Ok(AudienceScope::User {
                user_ids: self.target_user_ids.clone(),
            }),
        }
    }

    /// Check if the alert has passed its expiry time.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time <= now
    }

    /// Whether `now` falls inside `[start_time, expiry_time)`.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.expiry_time
    }

    /// Active and not archived.
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_archived
    }

    /// The single gate for any send of this alert, first or repeated.
    pub fn should_send_reminder(&self, now: DateTime<Utc>) -> bool {
        self.is_live() && self.reminder_enabled && self.is_within_window(now)
    }

    /// Reminder cadence as a duration.
    pub fn reminder_frequency(&self) -> Duration {
        Duration::hours(i64::from(self.reminder_frequency_hours))
    }
}

/// Data required to create a new alert.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAlert {
    /// Short headline.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Body text.
    #[validate(length(min = 1))]
    pub message: String,
    /// Urgency.
    pub severity: Severity,
    /// Delivery medium.
    pub delivery_channel: DeliveryChannel,
    /// Who receives the alert.
    pub scope: AudienceScope,
    /// Whether reminders are sent.
    #[serde(default = "default_true")]
    pub reminder_enabled: bool,
    /// Hours between reminders.
    #[validate(range(min = 1))]
    #[serde(default = "default_frequency")]
    pub reminder_frequency_hours: i32,
    /// Window start; defaults to creation time.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Window end.
    pub expiry_time: DateTime<Utc>,
}

impl NewAlert {
    /// Validate field constraints, the window, and the scope targets.
    pub fn check(&self, now: DateTime<Utc>) -> AppResult<()> {
        self.validate()
            .map_err(|e| AppError::validation(format!("Invalid alert: {e}")))?;

        let start = self.start_time.unwrap_or(now);
        if self.expiry_time <= start {
            return Err(AppError::validation(
                "Alert expiry_time must be strictly after start_time",
            ));
        }

        if !self.scope.has_targets() {
            return Err(AppError::validation(format!(
                "Alert with {} visibility must name at least one target",
                self.scope.visibility()
            )));
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_frequency() -> i32 {
    2
}
