//! Demo data for trying AlertHub locally.

use chrono::Duration;
use clap::Args;
use uuid::Uuid;

use crate::output;
use alerthub_core::Clock;
use alerthub_core::error::AppError;
use alerthub_entity::alert::{AudienceScope, DeliveryChannel, NewAlert, Severity};
use alerthub_entity::team::Team;
use alerthub_entity::user::User;
use alerthub_service::Engine;

/// Teams of the demo organisation.
const TEAMS: [&str; 3] = ["Engineering", "Marketing", "Sales"];

/// (username, team) pairs; `None` is the organisation admin.
const USERS: [(&str, Option<&str>); 6] = [
    ("admin", None),
    ("john", Some("Engineering")),
    ("sarah", Some("Engineering")),
    ("mike", Some("Marketing")),
    ("lisa", Some("Marketing")),
    ("tom", Some("Sales")),
];

/// Arguments for the seed command
#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Organisation to create
    #[arg(long, default_value = "default-org")]
    pub organization: String,

    /// Do not create the sample alerts
    #[arg(long)]
    pub no_alerts: bool,
}

/// What a seed run created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    /// Teams inserted.
    pub teams: usize,
    /// Users inserted.
    pub users: usize,
    /// Alerts created and sent.
    pub alerts: usize,
}

/// Execute the seed command
pub async fn execute(args: &SeedArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let (db, engine) = super::open_engine(&config).await?;

    println!("Seeding '{}'...", args.organization);
    let result = seed(&engine, &args.organization, !args.no_alerts).await;
    db.close().await;
    let summary = result?;

    output::print_success(&format!("Created {} teams", summary.teams));
    output::print_success(&format!("Created {} users", summary.users));
    output::print_success(&format!("Created {} sample alerts", summary.alerts));
    Ok(())
}

/// Insert the demo teams, users and alerts that do not exist yet.
///
/// Running it twice creates nothing the second time. Sample alerts are only
/// created while the store holds no alerts.
pub async fn seed(engine: &Engine, organization: &str, with_alerts: bool) -> Result<SeedSummary, AppError> {
    let directory = &engine.stores.directory;
    let now = engine.clock.now();
    let mut summary = SeedSummary::default();

    let mut teams = Vec::with_capacity(TEAMS.len());
    for name in TEAMS {
        let team = match directory.find_team_by_name(organization, name).await? {
            Some(team) => team,
            None => {
                summary.teams += 1;
                directory
                    .insert_team(&Team {
                        id: Uuid::new_v4(),
                        name: name.to_string(),
                        organization: organization.to_string(),
                        is_active: true,
                        created_at: now,
                    })
                    .await?
            }
        };
        teams.push(team);
    }
    let team_id = |name: &str| teams.iter().find(|t| t.name == name).map(|t| t.id);

    let mut users = Vec::with_capacity(USERS.len());
    for (username, team) in USERS {
        let user = match directory.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                summary.users += 1;
                directory
                    .insert_user(&User {
                        id: Uuid::new_v4(),
                        username: username.to_string(),
                        email: Some(format!("{}@example.com", username)),
                        phone_number: None,
                        organization: organization.to_string(),
                        team_id: team.and_then(team_id),
                        is_active: true,
                        created_at: now,
                    })
                    .await?
            }
        };
        users.push(user);
    }

    if !with_alerts || !engine.stores.alerts.list_alerts().await?.is_empty() {
        return Ok(summary);
    }

    let admin = users.iter().find(|u| u.username == "admin").map(|u| u.id);
    let john = users
        .iter()
        .find(|u| u.username == "john")
        .map(|u| u.id)
        .ok_or_else(|| AppError::internal("Seed user 'john' missing"))?;
    let engineering = team_id("Engineering").ok_or_else(|| AppError::internal("Seed team missing"))?;
    let marketing = team_id("Marketing").ok_or_else(|| AppError::internal("Seed team missing"))?;

    let samples = [
        (
            "System Maintenance Scheduled",
            "The system will undergo maintenance tomorrow from 2 AM to 4 AM. Please save your work.",
            Severity::Warning,
            AudienceScope::Organization {
                organization: organization.to_string(),
            },
            Duration::days(1),
        ),
        (
            "Code Review Required",
            "Please review the pending pull requests in the main repository.",
            Severity::Info,
            AudienceScope::Team {
                team_ids: vec![engineering],
            },
            Duration::days(7),
        ),
        (
            "Campaign Launch Deadline",
            "The new marketing campaign must be finalized by end of day tomorrow!",
            Severity::Critical,
            AudienceScope::Team {
                team_ids: vec![marketing],
            },
            Duration::days(1),
        ),
        (
            "Performance Review Reminder",
            "Your quarterly performance review is scheduled for next week.",
            Severity::Info,
            AudienceScope::User {
                user_ids: vec![john],
            },
            Duration::days(7),
        ),
    ];

    for (title, message, severity, scope, lifetime) in samples {
        let new = NewAlert {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            delivery_channel: DeliveryChannel::InApp,
            scope,
            reminder_enabled: true,
            reminder_frequency_hours: 2,
            start_time: None,
            expiry_time: now + lifetime,
        };
        engine.alerts.create_alert(new, admin).await?;
        summary.alerts += 1;
    }

    Ok(summary)
}
