//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use alerthub_core::config::DeliveryConfig;
use alerthub_core::{Clock, ManualClock};
use alerthub_database::MemoryStore;
use alerthub_database::store::{AlertStore, DirectoryStore, Stores};
use alerthub_entity::alert::{Alert, AudienceScope, DeliveryChannel, NewAlert, Severity};
use alerthub_entity::team::Team;
use alerthub_entity::user::User;
use alerthub_service::{AudienceResolver, Engine};
use alerthub_worker::{ReminderSweep, SnoozeResetSweep, build_sweeps};

/// Test application context
pub struct TestApp {
    /// Backing store, for direct inspection
    pub store: MemoryStore,
    /// The clock every service reads
    pub clock: Arc<ManualClock>,
    /// Wired services
    pub engine: Engine,
}

impl TestApp {
    /// Create a new test application at a fixed instant
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 11, 14, 0, 0).unwrap(),
        ));
        let engine = Engine::build(
            Stores::from_backend(Arc::new(store.clone())),
            clock.clone(),
            &DeliveryConfig::default(),
        )
        .expect("Failed to build engine");

        Self {
            store,
            clock,
            engine,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create_team(&self, name: &str, organization: &str) -> Team {
        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            organization: organization.to_string(),
            is_active: true,
            created_at: self.now(),
        };
        self.store.insert_team(&team).await.expect("Failed to insert team")
    }

    pub async fn create_user(&self, username: &str, organization: &str, team: Option<&Team>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: Some(format!("{username}@{organization}.test")),
            phone_number: None,
            organization: organization.to_string(),
            team_id: team.map(|t| t.id),
            is_active: true,
            created_at: self.now(),
        };
        self.store.insert_user(&user).await.expect("Failed to insert user")
    }

    /// Stored alert with a 2h cadence and a 7 day window starting now
    pub async fn create_alert(&self, scope: AudienceScope) -> Alert {
        let new = NewAlert {
            title: "Quarterly security training".to_string(),
            message: "Complete the training before the deadline".to_string(),
            severity: Severity::Warning,
            delivery_channel: DeliveryChannel::InApp,
            scope,
            reminder_enabled: true,
            reminder_frequency_hours: 2,
            start_time: None,
            expiry_time: self.now() + Duration::days(7),
        };
        let alert = Alert::from_new(new, None, self.now());
        self.store.insert_alert(&alert).await.expect("Failed to insert alert")
    }

    pub fn resolver(&self) -> AudienceResolver {
        AudienceResolver::new(self.engine.stores.directory.clone(), self.engine.store_timeout())
    }

    pub fn sweeps(&self) -> (Arc<ReminderSweep>, Arc<SnoozeResetSweep>) {
        build_sweeps(&self.engine)
    }
}
