//! Routes a send to the transport registered for its channel.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use alerthub_core::Clock;
use alerthub_core::config::DeliveryConfig;
use alerthub_core::timeout::bounded;
use alerthub_entity::alert::{Alert, DeliveryChannel};
use alerthub_entity::user::User;

use super::channels::{EmailChannel, InAppChannel, SmsChannel, Transport};
use super::outcome::DeliveryOutcome;

/// Dispatches alerts through the transport for each channel.
///
/// Every channel always has a transport, so selection never fails.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    in_app: Arc<dyn Transport>,
    email: Arc<dyn Transport>,
    sms: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    /// Upper bound for one transport attempt.
    timeout: Duration,
}

impl ChannelDispatcher {
    /// Creates a dispatcher with the built-in channel implementations.
    pub fn new(config: &DeliveryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            in_app: Arc::new(InAppChannel),
            email: Arc::new(EmailChannel::new(config.email_from.clone())),
            sms: Arc::new(SmsChannel::new(config.sms_max_length)),
            clock,
            timeout: config.dispatch_timeout(),
        }
    }

    /// Replace the transport serving `transport.channel()`.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        match transport.channel() {
            DeliveryChannel::InApp => self.in_app = transport,
            DeliveryChannel::Email => self.email = transport,
            DeliveryChannel::Sms => self.sms = transport,
        }
        self
    }

    /// The transport serving `channel`.
    pub fn transport_for(&self, channel: DeliveryChannel) -> &Arc<dyn Transport> {
        match channel {
            DeliveryChannel::InApp => &self.in_app,
            DeliveryChannel::Email => &self.email,
            DeliveryChannel::Sms => &self.sms,
        }
    }

    /// Send `alert` to `user` over `channel`.
    ///
    /// Never fails: transport errors and timeouts become an unsuccessful
    /// outcome carrying the error text.
    pub async fn send(&self, channel: DeliveryChannel, user: &User, alert: &Alert) -> DeliveryOutcome {
        let transport = self.transport_for(channel);

        let result = bounded("dispatch", self.timeout, transport.attempt(user, alert)).await;

        let error = match result {
            Ok(()) => {
                debug!(%channel, user_id = %user.id, alert_id = %alert.id, "Dispatched alert");
                None
            }
            Err(e) => {
                warn!(
                    %channel,
                    user_id = %user.id,
                    alert_id = %alert.id,
                    error = %e.message,
                    "Dispatch failed"
                );
                Some(e.message)
            }
        };

        DeliveryOutcome {
            success: error.is_none(),
            channel,
            user_id: user.id,
            alert_id: alert.id,
            sent_at: self.clock.now(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingTransport, Fixture, StalledTransport};
    use alerthub_entity::alert::AudienceScope;

    #[tokio::test]
    async fn test_selection_is_total() {
        let fx = Fixture::new().await;
        let dispatcher = fx.dispatcher();
        for channel in DeliveryChannel::ALL {
            assert_eq!(dispatcher.transport_for(channel).channel(), channel);
        }
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failed_outcome() {
        let fx = Fixture::new().await;
        let user = fx.user("u1", "acme", None).await;
        let alert = fx.alert(AudienceScope::User { user_ids: vec![user.id] }).await;
        let dispatcher = fx
            .dispatcher()
            .with_transport(Arc::new(FailingTransport(DeliveryChannel::Email)));

        let outcome = dispatcher.send(DeliveryChannel::Email, &user, &alert).await;
        assert!(!outcome.success);
        assert_eq!(outcome.channel, DeliveryChannel::Email);
        assert!(outcome.error.unwrap().contains("gateway rejected"));

        let outcome = dispatcher.send(DeliveryChannel::InApp, &user, &alert).await;
        assert!(outcome.success);
        assert_eq!(outcome.sent_at, fx.now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transport_times_out() {
        let fx = Fixture::new().await;
        let user = fx.user("u1", "acme", None).await;
        let alert = fx.alert(AudienceScope::User { user_ids: vec![user.id] }).await;
        let dispatcher = fx
            .dispatcher()
            .with_transport(Arc::new(StalledTransport(DeliveryChannel::Sms)));

        let outcome = dispatcher.send(DeliveryChannel::Sms, &user, &alert).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("timed out"));
    }
}
