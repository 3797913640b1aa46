//! Run a sweep once, outside the scheduler.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use alerthub_core::error::AppError;
use alerthub_worker::{ReminderSweepReport, SweepEntryOutcome, build_sweeps};

/// Arguments for sweep commands
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Sweep subcommand
    #[command(subcommand)]
    pub command: SweepCommand,
}

/// Sweep subcommands
#[derive(Debug, Subcommand)]
pub enum SweepCommand {
    /// Send reminders for every live alert
    Reminders,
    /// Clear lapsed snoozes
    ResetSnoozes,
}

/// One alert of a reminder sweep, for table output
#[derive(Debug, Serialize, Tabled)]
struct SweepRow {
    /// Alert ID
    alert_id: String,
    /// Title
    title: String,
    /// Outcome
    outcome: String,
    /// Sent
    sent: usize,
    /// Failed
    failed: usize,
    /// Snoozed
    snoozed: usize,
    /// Too soon
    skipped: usize,
}

/// Execute sweep commands
pub async fn execute(args: &SweepArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let (db, engine) = super::open_engine(&config).await?;
    let (reminders, snooze_reset) = build_sweeps(&engine);

    let result = match &args.command {
        SweepCommand::Reminders => reminders.process_reminders().await.map(|report| {
            print_report(&report, format);
        }),
        SweepCommand::ResetSnoozes => snooze_reset.reset_expired_snoozes().await.map(|cleared| {
            output::print_success(&format!("Cleared {} expired snoozes", cleared));
        }),
    };

    db.close().await;
    result
}

fn print_report(report: &ReminderSweepReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(report);
        return;
    }

    let rows: Vec<SweepRow> = report
        .entries
        .iter()
        .map(|entry| {
            let mut row = SweepRow {
                alert_id: entry.alert_id.to_string(),
                title: entry.title.clone(),
                outcome: String::new(),
                sent: 0,
                failed: 0,
                snoozed: 0,
                skipped: 0,
            };
            match &entry.outcome {
                SweepEntryOutcome::Processed(r) => {
                    row.outcome = "processed".to_string();
                    row.sent = r.sent;
                    row.failed = r.failed;
                    row.snoozed = r.snoozed;
                    row.skipped = r.skipped;
                }
                SweepEntryOutcome::Skipped { reason } => row.outcome = format!("skipped: {}", reason),
                SweepEntryOutcome::Failed { error } => row.outcome = format!("failed: {}", error),
            }
            row
        })
        .collect();

    output::print_list(&rows, OutputFormat::Table);
    output::print_success(&format!(
        "Sweep done: {} alerts, {} reminders sent, {} alerts failed",
        report.entries.len(),
        report.reminders_sent(),
        report.failed_alerts()
    ));
}
