//! Team entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A team inside an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    /// Unique team identifier.
    pub id: Uuid,
    /// Team name, unique within the organization.
    pub name: String,
    /// Organization the team belongs to.
    pub organization: String,
    /// Whether the team is active.
    pub is_active: bool,
    /// When the team was created.
    pub created_at: DateTime<Utc>,
}
