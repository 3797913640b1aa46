//! Shared fixtures for sweep tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use alerthub_core::config::DeliveryConfig;
use alerthub_core::{Clock, ManualClock};
use alerthub_database::MemoryStore;
use alerthub_database::store::{AlertStore, DirectoryStore, Stores};
use alerthub_entity::alert::{Alert, AudienceScope, DeliveryChannel, NewAlert, Severity};
use alerthub_entity::user::User;
use alerthub_service::Engine;

use crate::sweeps::{ReminderSweep, SnoozeResetSweep};

pub(crate) struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub engine: Engine,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
        ));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let engine = Engine::build(
            Stores::from_backend(Arc::new(store.clone())),
            dyn_clock,
            &DeliveryConfig::default(),
        )
        .unwrap();
        Self { store, clock, engine }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn user(&self, username: &str, organization: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: Some(format!("{username}@example.test")),
            phone_number: None,
            organization: organization.to_string(),
            team_id: None,
            is_active: true,
            created_at: self.now(),
        };
        self.store.insert_user(&user).await.unwrap()
    }

    pub async fn org_alert(&self, organization: &str, title: &str) -> Alert {
        let new = NewAlert {
            title: title.to_string(),
            message: "Please acknowledge".to_string(),
            severity: Severity::Info,
            delivery_channel: DeliveryChannel::InApp,
            scope: AudienceScope::Organization {
                organization: organization.to_string(),
            },
            reminder_enabled: true,
            reminder_frequency_hours: 2,
            start_time: None,
            expiry_time: self.now() + Duration::days(7),
        };
        let alert = Alert::from_new(new, None, self.now());
        self.store.insert_alert(&alert).await.unwrap()
    }

    pub fn reminder_sweep(&self) -> ReminderSweep {
        ReminderSweep::new(
            self.engine.stores.alerts.clone(),
            self.engine.orchestrator.clone(),
            self.engine.clock.clone(),
            self.engine.store_timeout(),
        )
    }

    pub fn snooze_reset(&self) -> SnoozeResetSweep {
        SnoozeResetSweep::new(
            self.engine.stores.preferences.clone(),
            self.engine.clock.clone(),
            self.engine.store_timeout(),
        )
    }
}
