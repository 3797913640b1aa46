//! Uniform result of one channel send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alerthub_entity::alert::DeliveryChannel;

/// What happened when a channel tried to reach one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Whether the transport accepted the message.
    pub success: bool,
    /// Channel used.
    pub channel: DeliveryChannel,
    /// Recipient.
    pub user_id: Uuid,
    /// Alert sent.
    pub alert_id: Uuid,
    /// When the attempt completed.
    pub sent_at: DateTime<Utc>,
    /// Transport error, timeouts included.
    pub error: Option<String>,
}
