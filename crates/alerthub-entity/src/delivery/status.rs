//! Delivery status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Not attempted yet.
    Pending,
    /// Handed to the transport.
    Sent,
    /// The transport reported a failure.
    Failed,
    /// The recipient read the alert.
    Read,
}

impl DeliveryStatus {
    /// Allowed transitions: pending → sent → read, pending → failed.
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sent) | (Self::Pending, Self::Failed) | (Self::Sent, Self::Read)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Sent));
        assert!(DeliveryStatus::Sent.can_transition_to(DeliveryStatus::Read));
        assert!(DeliveryStatus::Pending.can_transition_to(DeliveryStatus::Failed));
        assert!(!DeliveryStatus::Failed.can_transition_to(DeliveryStatus::Sent));
        assert!(!DeliveryStatus::Read.can_transition_to(DeliveryStatus::Sent));
    }
}
