//! Alert lifecycle and delivery statistics.

pub mod service;
pub mod stats;

pub use service::{AlertListFilter, AlertService, CreatedAlert};
pub use stats::{AlertStats, SystemOverview, SystemStats};
