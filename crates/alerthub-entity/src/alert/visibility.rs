//! Alert targeting rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored discriminator for who an alert targets.
///
/// Decoding a row with any other value fails, so a misconfigured alert is
/// reported instead of silently resolving to nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum Visibility {
    /// Everyone in one organization.
    Organization,
    /// Members of a set of teams.
    Team,
    /// An explicit list of users.
    User,
}

impl Visibility {
    /// Return the visibility as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Team => "Team",
            Self::User => "User",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A visibility together with the targets that are meaningful for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "visibility", rename_all = "snake_case")]
pub enum AudienceScope {
    /// All active users of the organization.
    Organization {
        /// Target organization id.
        organization: String,
    },
    /// All active members of any listed team.
    Team {
        /// Target team ids.
        team_ids: Vec<Uuid>,
    },
    /// The listed users that are still active.
    User {
        /// Target user ids.
        user_ids: Vec<Uuid>,
    },
}

impl AudienceScope {
    /// The stored discriminator for this scope.
    pub fn visibility(&self) -> Visibility {
        match self {
            Self::Organization { .. } => Visibility::Organization,
            Self::Team { .. } => Visibility::Team,
            Self::User { .. } => Visibility::User,
        }
    }

    /// Whether the scope names at least one target.
    pub fn has_targets(&self) -> bool {
        match self {
            Self::Organization { organization } => !organization.trim().is_empty(),
            Self::Team { team_ids } => !team_ids.is_empty(),
            Self::User { user_ids } => !user_ids.is_empty(),
        }
    }
}
