//! Per-user inbox commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use alerthub_core::error::AppError;
use alerthub_service::Engine;

/// Arguments for inbox commands
#[derive(Debug, Args)]
pub struct InboxArgs {
    /// Username whose inbox to act on
    #[arg(short, long)]
    pub user: String,

    /// Inbox subcommand
    #[command(subcommand)]
    pub command: InboxCommand,
}

/// Inbox subcommands
#[derive(Debug, Subcommand)]
pub enum InboxCommand {
    /// Alerts currently addressed to the user
    List,
    /// Alerts the user has snoozed
    Snoozed,
    /// Mark an alert read
    Read {
        /// Alert ID
        alert_id: Uuid,
    },
    /// Mark an alert unread
    Unread {
        /// Alert ID
        alert_id: Uuid,
    },
    /// Snooze an alert until the end of today
    Snooze {
        /// Alert ID
        alert_id: Uuid,
    },
}

/// Inbox display row for table output
#[derive(Debug, Serialize, Tabled)]
struct InboxRow {
    /// Alert ID
    id: String,
    /// Title
    title: String,
    /// Severity
    severity: String,
    /// Read flag
    read: bool,
    /// Snooze expiry, if snoozed
    snoozed_until: String,
}

/// Execute inbox commands
pub async fn execute(args: &InboxArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let (db, engine) = super::open_engine(&config).await?;

    let result = run(&engine, args, format).await;
    db.close().await;
    result
}

async fn run(engine: &Engine, args: &InboxArgs, format: OutputFormat) -> Result<(), AppError> {
    let user = super::require_user(engine, &args.user).await?;

    match &args.command {
        InboxCommand::List => {
            let entries = engine.inbox.visible_alerts(user.id).await?;
            let rows: Vec<InboxRow> = entries
                .iter()
                .map(|e| InboxRow {
                    id: e.alert.id.to_string(),
                    title: e.alert.title.clone(),
                    severity: e.alert.severity.to_string(),
                    read: e.is_read,
                    snoozed_until: e
                        .snooze_until
                        .filter(|_| e.is_snoozed)
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        InboxCommand::Snoozed => {
            let snoozed = engine.inbox.snoozed_alerts(user.id).await?;
            let rows: Vec<InboxRow> = snoozed
                .iter()
                .map(|s| InboxRow {
                    id: s.alert.id.to_string(),
                    title: s.alert.title.clone(),
                    severity: s.alert.severity.to_string(),
                    read: false,
                    snoozed_until: s
                        .snooze_until
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        InboxCommand::Read { alert_id } => {
            engine.inbox.mark_read(user.id, *alert_id).await?;
            output::print_success(&format!("Alert {} marked read for '{}'", alert_id, user.username));
        }
        InboxCommand::Unread { alert_id } => {
            engine.inbox.mark_unread(user.id, *alert_id).await?;
            output::print_success(&format!(
                "Alert {} marked unread for '{}'",
                alert_id, user.username
            ));
        }
        InboxCommand::Snooze { alert_id } => {
            let pref = engine.inbox.snooze(user.id, *alert_id).await?;
            let until = pref
                .snooze_until
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            output::print_success(&format!("Alert {} snoozed until {}", alert_id, until));
        }
    }

    Ok(())
}
