//! Per-alert send orchestration.

pub mod report;
pub mod service;

pub use report::{AlertSendReport, AlertSkipReason, SendAlertResult, SendReason, UserSendOutcome};
pub use service::SendOrchestrator;
