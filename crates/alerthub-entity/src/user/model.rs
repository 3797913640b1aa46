//! User entity model.
//!
//! Users are owned by the identity subsystem; AlertHub only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A member of an organization who can receive alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Login name.
    pub username: String,
    /// Email address used by the email channel.
    pub email: Option<String>,
    /// Phone number used by the SMS channel.
    pub phone_number: Option<String>,
    /// Organization the user belongs to.
    pub organization: String,
    /// Team the user belongs to, if any.
    pub team_id: Option<Uuid>,
    /// Whether the account is active.
    pub is_active: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A label for logs and reports.
    pub fn contact_label(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.username)
    }
}
