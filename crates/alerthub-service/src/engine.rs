//! Wiring of every delivery service over one set of stores.

use std::sync::Arc;
use std::time::Duration;

use alerthub_core::Clock;
use alerthub_core::config::DeliveryConfig;
use alerthub_core::error::AppResult;
use alerthub_database::store::Stores;

use crate::alert::AlertService;
use crate::audience::AudienceResolver;
use crate::dispatch::ChannelDispatcher;
use crate::inbox::InboxService;
use crate::orchestrator::SendOrchestrator;
use crate::preference::PreferenceService;

/// Every service of the delivery engine, sharing stores and clock.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Backing stores.
    pub stores: Stores,
    /// Time source for all rules.
    pub clock: Arc<dyn Clock>,
    /// Preference accessor.
    pub preferences: PreferenceService,
    /// Send orchestrator.
    pub orchestrator: SendOrchestrator,
    /// Alert lifecycle.
    pub alerts: AlertService,
    /// Per-user inbox.
    pub inbox: InboxService,
    store_timeout: Duration,
}

impl Engine {
    /// Build the engine with the built-in channel implementations.
    pub fn build(stores: Stores, clock: Arc<dyn Clock>, config: &DeliveryConfig) -> AppResult<Self> {
        let dispatcher = ChannelDispatcher::new(config, clock.clone());
        Self::with_dispatcher(stores, clock, config, dispatcher)
    }

    /// Build the engine around a custom dispatcher.
    pub fn with_dispatcher(
        stores: Stores,
        clock: Arc<dyn Clock>,
        config: &DeliveryConfig,
        dispatcher: ChannelDispatcher,
    ) -> AppResult<Self> {
        let store_timeout = config.store_timeout();
        let offset = config.offset()?;

        let preferences = PreferenceService::new(
            stores.preferences.clone(),
            stores.deliveries.clone(),
            clock.clone(),
            offset,
            store_timeout,
        );
        let resolver = AudienceResolver::new(stores.directory.clone(), store_timeout);
        let orchestrator = SendOrchestrator::new(
            stores.alerts.clone(),
            stores.deliveries.clone(),
            resolver,
            preferences.clone(),
            dispatcher,
            clock.clone(),
            store_timeout,
        );
        let alerts = AlertService::new(
            stores.alerts.clone(),
            stores.deliveries.clone(),
            stores.preferences.clone(),
            orchestrator.clone(),
            clock.clone(),
            offset,
            store_timeout,
        );
        let inbox = InboxService::new(
            stores.alerts.clone(),
            stores.directory.clone(),
            preferences.clone(),
            clock.clone(),
            store_timeout,
        );

        Ok(Self {
            stores,
            clock,
            preferences,
            orchestrator,
            alerts,
            inbox,
            store_timeout,
        })
    }

    /// Time budget applied to every store call.
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }
}
