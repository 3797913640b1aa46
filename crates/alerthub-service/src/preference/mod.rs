//! Per-(user, alert) read, snooze, and reminder state.

pub mod service;

pub use service::PreferenceService;
