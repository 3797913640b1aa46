//! A user's view of the alerts addressed to them.

pub mod service;

pub use service::{InboxEntry, InboxService, SnoozedAlert};
