//! # alerthub-service
//!
//! The delivery engine. Services take their stores, clock, and transports
//! at construction time as `Arc` handles, evaluate every rule against the
//! injected [`Clock`](alerthub_core::Clock), and bound every store and
//! transport call by the configured time budget.

pub mod alert;
pub mod audience;
pub mod dispatch;
pub mod engine;
pub mod inbox;
pub mod orchestrator;
pub mod preference;

#[cfg(test)]
pub(crate) mod testing;

pub use alert::{
    AlertListFilter, AlertService, AlertStats, CreatedAlert, SystemOverview, SystemStats,
};
pub use audience::AudienceResolver;
pub use dispatch::{ChannelDispatcher, DeliveryOutcome, Transport};
pub use engine::Engine;
pub use inbox::{InboxEntry, InboxService, SnoozedAlert};
pub use orchestrator::{
    AlertSendReport, AlertSkipReason, SendAlertResult, SendOrchestrator, SendReason,
    UserSendOutcome,
};
pub use preference::PreferenceService;
