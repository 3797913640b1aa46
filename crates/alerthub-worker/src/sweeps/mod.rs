//! Built-in sweep implementations.

pub mod reminder;
pub mod snooze_reset;

pub use reminder::{AlertSweepEntry, ReminderSweep, ReminderSweepReport, SweepEntryOutcome};
pub use snooze_reset::SnoozeResetSweep;
