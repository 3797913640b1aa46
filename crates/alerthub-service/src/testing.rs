//! Shared fixtures for service tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use alerthub_core::config::DeliveryConfig;
use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_core::{Clock, ManualClock};
use alerthub_database::MemoryStore;
use alerthub_database::store::{AlertStore, DirectoryStore, Stores};
use alerthub_entity::alert::{Alert, AudienceScope, DeliveryChannel, NewAlert, Severity};
use alerthub_entity::team::Team;
use alerthub_entity::user::User;

use crate::alert::AlertService;
use crate::audience::AudienceResolver;
use crate::dispatch::{ChannelDispatcher, Transport};
use crate::inbox::InboxService;
use crate::orchestrator::SendOrchestrator;
use crate::preference::PreferenceService;

pub(crate) struct Fixture {
    pub store: MemoryStore,
    pub stores: Stores,
    pub clock: Arc<ManualClock>,
    pub config: DeliveryConfig,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        Self {
            stores: Stores::from_backend(Arc::new(store.clone())),
            store,
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2026, 4, 14, 9, 30, 0).unwrap(),
            )),
            config: DeliveryConfig::default(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub async fn team(&self, name: &str, organization: &str) -> Team {
        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            organization: organization.to_string(),
            is_active: true,
            created_at: self.now(),
        };
        self.store.insert_team(&team).await.unwrap()
    }

    pub async fn user(&self, username: &str, organization: &str, team_id: Option<Uuid>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: Some(format!("{username}@{organization}.test")),
            phone_number: Some("+15550100".to_string()),
            organization: organization.to_string(),
            team_id,
            is_active: true,
            created_at: self.now(),
        };
        self.store.insert_user(&user).await.unwrap()
    }

    pub async fn alert(&self, scope: AudienceScope) -> Alert {
        let new = NewAlert {
            title: "Scheduled maintenance".to_string(),
            message: "Systems will be briefly unavailable".to_string(),
            severity: Severity::Warning,
            delivery_channel: DeliveryChannel::InApp,
            scope,
            reminder_enabled: true,
            reminder_frequency_hours: 2,
            start_time: None,
            expiry_time: self.now() + Duration::days(7),
        };
        let alert = Alert::from_new(new, None, self.now());
        self.store.insert_alert(&alert).await.unwrap()
    }

    pub async fn replace_alert(&self, alert: Alert) {
        self.store.put_alert(alert).await;
    }

    pub fn resolver(&self) -> AudienceResolver {
        AudienceResolver::new(self.stores.directory.clone(), self.config.store_timeout())
    }

    pub fn preferences(&self) -> PreferenceService {
        PreferenceService::new(
            self.stores.preferences.clone(),
            self.stores.deliveries.clone(),
            self.clock(),
            self.config.offset().unwrap(),
            self.config.store_timeout(),
        )
    }

    pub fn dispatcher(&self) -> ChannelDispatcher {
        ChannelDispatcher::new(&self.config, self.clock())
    }

    pub fn orchestrator(&self) -> SendOrchestrator {
        self.orchestrator_with(self.dispatcher())
    }

    pub fn orchestrator_with(&self, dispatcher: ChannelDispatcher) -> SendOrchestrator {
        SendOrchestrator::new(
            self.stores.alerts.clone(),
            self.stores.deliveries.clone(),
            self.resolver(),
            self.preferences(),
            dispatcher,
            self.clock(),
            self.config.store_timeout(),
        )
    }

    pub fn alerts(&self) -> AlertService {
        AlertService::new(
            self.stores.alerts.clone(),
            self.stores.deliveries.clone(),
            self.stores.preferences.clone(),
            self.orchestrator(),
            self.clock(),
            self.config.offset().unwrap(),
            self.config.store_timeout(),
        )
    }

    pub fn inbox(&self) -> InboxService {
        InboxService::new(
            self.stores.alerts.clone(),
            self.stores.directory.clone(),
            self.preferences(),
            self.clock(),
            self.config.store_timeout(),
        )
    }
}

/// A transport whose provider always rejects the message.
#[derive(Debug)]
pub(crate) struct FailingTransport(pub DeliveryChannel);

#[async_trait]
impl Transport for FailingTransport {
    fn channel(&self) -> DeliveryChannel {
        self.0
    }

    async fn attempt(&self, _user: &User, _alert: &Alert) -> AppResult<()> {
        Err(AppError::external_service("gateway rejected the message"))
    }
}

/// A transport whose provider never answers.
#[derive(Debug)]
pub(crate) struct StalledTransport(pub DeliveryChannel);

#[async_trait]
impl Transport for StalledTransport {
    fn channel(&self) -> DeliveryChannel {
        self.0
    }

    async fn attempt(&self, _user: &User, _alert: &Alert) -> AppResult<()> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// A transport that parks every attempt until the test releases it.
#[derive(Debug)]
pub(crate) struct GatedTransport {
    channel: DeliveryChannel,
    /// Signalled when an attempt has started.
    pub entered: Arc<Notify>,
    /// Signal to let one parked attempt succeed.
    pub release: Arc<Notify>,
}

impl GatedTransport {
    pub fn new(channel: DeliveryChannel) -> Self {
        Self {
            channel,
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Transport for GatedTransport {
    fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    async fn attempt(&self, _user: &User, _alert: &Alert) -> AppResult<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}
