//! Alert management CLI commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_entity::alert::{AudienceScope, DeliveryChannel, NewAlert, Severity};
use alerthub_service::{AlertListFilter, Engine, SendAlertResult};

/// Arguments for alert commands
#[derive(Debug, Args)]
pub struct AlertArgs {
    /// Alert subcommand
    #[command(subcommand)]
    pub command: AlertCommand,
}

/// Alert subcommands
#[derive(Debug, Subcommand)]
pub enum AlertCommand {
    /// List unarchived alerts
    List {
        /// `all`, `active` or `expired`
        #[arg(long, default_value = "all")]
        filter: String,
    },
    /// Create an alert and send it immediately
    Create(CreateArgs),
    /// Re-send an alert to its whole audience
    Trigger {
        /// Alert ID
        id: Uuid,
    },
    /// Archive an alert
    Archive {
        /// Alert ID
        id: Uuid,
    },
    /// Resume sending a deactivated alert
    Activate {
        /// Alert ID
        id: Uuid,
    },
    /// Stop sending an alert without archiving it
    Deactivate {
        /// Alert ID
        id: Uuid,
    },
    /// System-wide totals, breakdowns and recent activity
    Overview,
    /// Show delivery statistics
    Stats {
        /// Alert ID
        id: Uuid,
    },
}

/// Severity as accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    /// Informational
    Info,
    /// Needs attention soon
    Warning,
    /// Needs attention now
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(value: SeverityArg) -> Self {
        match value {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

/// Who receives a new alert; exactly one target kind is required
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct TargetArgs {
    /// Everyone in this organization
    #[arg(long)]
    pub organization: Option<String>,
    /// Members of these teams (by name, within `--team-org`)
    #[arg(long = "team")]
    pub teams: Vec<String>,
    /// These users (by username)
    #[arg(long = "user")]
    pub users: Vec<String>,
}

/// Arguments for `alert create`
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Short title
    #[arg(long)]
    pub title: String,
    /// Body text
    #[arg(long)]
    pub message: String,
    /// Severity
    #[arg(long, value_enum, default_value = "info")]
    pub severity: SeverityArg,
    /// `InApp`, `Email` or `SMS`
    #[arg(long, default_value = "InApp")]
    pub channel: String,
    /// Audience
    #[command(flatten)]
    pub target: TargetArgs,
    /// Organization that `--team` names belong to
    #[arg(long, default_value = "default-org")]
    pub team_org: String,
    /// Disable reminders
    #[arg(long)]
    pub no_reminders: bool,
    /// Hours between reminders
    #[arg(long, default_value_t = 2)]
    pub frequency_hours: i32,
    /// Hours until the alert expires
    #[arg(long, default_value_t = 24)]
    pub expires_in_hours: i64,
}

/// Alert display row for table output
#[derive(Debug, Serialize, Tabled)]
struct AlertRow {
    /// Alert ID
    id: String,
    /// Title
    title: String,
    /// Severity
    severity: String,
    /// Channel
    channel: String,
    /// Visibility
    visibility: String,
    /// Active flag
    active: bool,
    /// Expiry
    expires: String,
}

/// One bucket of a breakdown or histogram
#[derive(Debug, Serialize, Tabled)]
struct CountRow {
    /// Bucket
    bucket: String,
    /// Alerts
    count: i64,
}

/// Per-user line of a send report
#[derive(Debug, Serialize, Tabled)]
struct SendRow {
    /// Username
    username: String,
    /// Outcome
    status: String,
    /// Channel
    channel: String,
    /// Error text, if any
    error: String,
}

/// Execute alert commands
pub async fn execute(args: &AlertArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let (db, engine) = super::open_engine(&config).await?;

    let result = run(&engine, &args.command, format).await;
    db.close().await;
    result
}

async fn run(engine: &Engine, command: &AlertCommand, format: OutputFormat) -> Result<(), AppError> {
    match command {
        AlertCommand::List { filter } => {
            let alerts = engine
                .alerts
                .list_alerts(AlertListFilter::from_str_value(filter))
                .await?;
            let rows: Vec<AlertRow> = alerts
                .iter()
                .map(|a| AlertRow {
                    id: a.id.to_string(),
                    title: a.title.clone(),
                    severity: a.severity.to_string(),
                    channel: a.delivery_channel.to_string(),
                    visibility: a.visibility.to_string(),
                    active: a.is_active,
                    expires: a.expiry_time.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        AlertCommand::Create(create) => {
            let new = build_new_alert(engine, create).await?;
            let created = engine.alerts.create_alert(new, None).await?;
            output::print_success(&format!(
                "Alert '{}' created (id: {})",
                created.alert.title, created.alert.id
            ));
            print_send_result(&created.delivery, format);
        }
        AlertCommand::Trigger { id } => {
            let result = engine.alerts.trigger_alert(*id).await?;
            print_send_result(&result, format);
        }
        AlertCommand::Archive { id } => {
            let alert = engine.alerts.archive_alert(*id).await?;
            output::print_success(&format!("Alert '{}' archived", alert.title));
        }
        AlertCommand::Activate { id } | AlertCommand::Deactivate { id } => {
            let activate = matches!(command, AlertCommand::Activate { .. });
            let alert = engine.alerts.set_active(*id, activate).await?;
            output::print_success(&format!(
                "Alert '{}' {}",
                alert.title,
                if activate { "activated" } else { "deactivated" }
            ));
        }
        AlertCommand::Overview => {
            let stats = engine.alerts.system_stats().await?;
            if format == OutputFormat::Json {
                output::print_json(&stats);
                return Ok(());
            }
            let o = &stats.overview;
            println!("System Overview:");
            output::print_kv("Alerts", &o.total_alerts.to_string());
            output::print_kv("Active", &o.active_alerts.to_string());
            output::print_kv("Expired", &o.expired_alerts.to_string());
            output::print_kv("Delivered", &o.total_delivered.to_string());
            output::print_kv("Read", &o.total_read.to_string());
            output::print_kv("Snoozed now", &o.total_snoozed.to_string());
            output::print_kv("Read rate", &format!("{:.2}%", o.read_rate));

            for (heading, counts) in [
                ("By severity", &stats.by_severity),
                ("By channel", &stats.by_channel),
                ("By visibility", &stats.by_visibility),
            ] {
                println!("\n{heading}:");
                let rows: Vec<CountRow> = counts
                    .iter()
                    .map(|c| CountRow {
                        bucket: c.label.clone(),
                        count: c.count,
                    })
                    .collect();
                output::print_list(&rows, OutputFormat::Table);
            }

            println!("\nCreated in the last 7 days:");
            let rows: Vec<CountRow> = stats
                .recent_activity
                .iter()
                .map(|d| CountRow {
                    bucket: d.day.to_string(),
                    count: d.count,
                })
                .collect();
            output::print_list(&rows, OutputFormat::Table);
        }
        AlertCommand::Stats { id } => {
            let stats = engine.alerts.alert_stats(*id).await?;
            match format {
                OutputFormat::Json => output::print_json(&stats),
                OutputFormat::Table => {
                    println!("Alert Statistics:");
                    output::print_kv("Title", &stats.title);
                    output::print_kv("Severity", stats.severity.as_str());
                    output::print_kv("Total deliveries", &stats.total_deliveries.to_string());
                    output::print_kv("Read", &stats.read_count.to_string());
                    output::print_kv("Snoozed now", &stats.snoozed_count.to_string());
                    output::print_kv("Reminders", &stats.reminder_count.to_string());
                    output::print_kv("Read rate", &format!("{:.2}%", stats.read_rate));
                    for entry in &stats.status_breakdown {
                        output::print_kv(
                            &format!("Status {}", entry.status.as_str()),
                            &entry.count.to_string(),
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

/// Resolve command-line targets into an alert definition
async fn build_new_alert(engine: &Engine, args: &CreateArgs) -> Result<NewAlert, AppError> {
    let scope = if let Some(organization) = &args.target.organization {
        AudienceScope::Organization {
            organization: organization.clone(),
        }
    } else if !args.target.teams.is_empty() {
        let mut team_ids = Vec::with_capacity(args.target.teams.len());
        for name in &args.target.teams {
            let team = engine
                .stores
                .directory
                .find_team_by_name(&args.team_org, name)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Team '{}' not found in '{}'", name, args.team_org))
                })?;
            team_ids.push(team.id);
        }
        AudienceScope::Team { team_ids }
    } else {
        let mut user_ids = Vec::with_capacity(args.target.users.len());
        for username in &args.target.users {
            user_ids.push(super::require_user(engine, username).await?.id);
        }
        AudienceScope::User { user_ids }
    };

    Ok(NewAlert {
        title: args.title.clone(),
        message: args.message.clone(),
        severity: args.severity.into(),
        delivery_channel: DeliveryChannel::from_str_value(&args.channel),
        scope,
        reminder_enabled: !args.no_reminders,
        reminder_frequency_hours: args.frequency_hours,
        start_time: None,
        expiry_time: engine.clock.now() + chrono::Duration::hours(args.expires_in_hours),
    })
}

/// Print the outcome of a send pass
pub fn print_send_result(result: &SendAlertResult, format: OutputFormat) {
    if format == OutputFormat::Json {
        output::print_json(result);
        return;
    }

    match result {
        SendAlertResult::Skipped { alert_id, reason } => {
            output::print_warning(&format!("Alert {} not sent: {}", alert_id, reason));
        }
        SendAlertResult::Delivered(report) => {
            println!("Send Report:");
            output::print_kv("Alert", &report.title);
            output::print_kv("Reminder", &report.is_reminder.to_string());
            output::print_kv("Audience", &report.total.to_string());
            output::print_kv("Sent", &report.sent.to_string());
            output::print_kv("Failed", &report.failed.to_string());
            output::print_kv("Snoozed", &report.snoozed.to_string());
            output::print_kv("Skipped", &report.skipped.to_string());

            let rows: Vec<SendRow> = report
                .details
                .iter()
                .map(|d| SendRow {
                    username: d.username.clone(),
                    status: d
                        .reason
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "sent".to_string()),
                    channel: d.channel.to_string(),
                    error: d.error.clone().unwrap_or_default(),
                })
                .collect();
            output::print_list(&rows, OutputFormat::Table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use alerthub_core::ManualClock;
    use alerthub_core::config::DeliveryConfig;
    use alerthub_database::MemoryStore;
    use alerthub_database::store::Stores;
    use chrono::{TimeZone, Utc};

    async fn seeded_engine() -> Engine {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
        ));
        let engine = Engine::build(
            Stores::from_backend(Arc::new(MemoryStore::new())),
            clock,
            &DeliveryConfig::default(),
        )
        .unwrap();
        super::super::seed::seed(&engine, "default-org", true).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_deactivate_and_activate_commands() {
        let engine = seeded_engine().await;
        let alert = engine.alerts.list_alerts(AlertListFilter::All).await.unwrap()[0].clone();

        run(&engine, &AlertCommand::Deactivate { id: alert.id }, OutputFormat::Json)
            .await
            .unwrap();
        assert!(!engine.alerts.get_alert(alert.id).await.unwrap().is_active);

        run(&engine, &AlertCommand::Activate { id: alert.id }, OutputFormat::Json)
            .await
            .unwrap();
        assert!(engine.alerts.get_alert(alert.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_overview_reports_seeded_alerts() {
        let engine = seeded_engine().await;
        run(&engine, &AlertCommand::Overview, OutputFormat::Table)
            .await
            .unwrap();

        let stats = engine.alerts.system_stats().await.unwrap();
        assert_eq!(stats.overview.total_alerts, 4);
        assert_eq!(stats.overview.total_delivered, 11);
        assert_eq!(stats.recent_activity.last().unwrap().count, 4);
    }
}
