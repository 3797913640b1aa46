//! Periodic sweeps for AlertHub.
//!
//! This crate provides:
//! - The reminder sweep, which re-sends every live alert as a reminder
//! - The snooze-reset sweep, which clears lapsed snoozes in bulk
//! - A scheduler running both on independent intervals, never overlapping
//!   a sweep with itself
//! - The service runtime used by the server binary and `alerthub-cli serve`

pub mod runtime;
pub mod scheduler;
pub mod sweeps;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use runtime::{ServeOptions, build_sweeps, run_service};
pub use scheduler::SweepScheduler;
pub use sweeps::{AlertSweepEntry, ReminderSweep, ReminderSweepReport, SnoozeResetSweep, SweepEntryOutcome};
pub use task::{GuardedSweep, SweepError, SweepOutcome, SweepTask};
