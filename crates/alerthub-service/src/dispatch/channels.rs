//! Channel implementations.
//!
//! Real transport wiring (SMTP relay, SMS gateway, push service) lives
//! outside this crate. These implementations render the channel-specific
//! message and hand it to the log, which is the in-app store of record for
//! single-node deployments.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use alerthub_core::error::AppError;
use alerthub_core::error::AppResult;
use alerthub_entity::alert::{Alert, DeliveryChannel};
use alerthub_entity::user::User;

/// A delivery medium able to reach one user with one alert.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug + 'static {
    /// Channel this transport serves.
    fn channel(&self) -> DeliveryChannel;

    /// Try to deliver `alert` to `user`.
    ///
    /// Provider failures are `ExternalService` errors whose message is the
    /// reason stored on the failed delivery record.
    async fn attempt(&self, user: &User, alert: &Alert) -> AppResult<()>;
}

/// In-app notification feed.
#[derive(Debug, Clone, Default)]
pub struct InAppChannel;

#[async_trait]
impl Transport for InAppChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::InApp
    }

    async fn attempt(&self, user: &User, alert: &Alert) -> AppResult<()> {
        info!(
            channel = "InApp",
            user_id = %user.id,
            recipient = %user.contact_label(),
            alert_id = %alert.id,
            title = %alert.title,
            "In-app alert posted"
        );
        Ok(())
    }
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Outbound email.
#[derive(Debug, Clone)]
pub struct EmailChannel {
    from: String,
}

impl EmailChannel {
    /// Creates an email channel sending as `from`.
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }

    /// Render the email for `user`. Users without an address cannot be reached.
    pub fn render(&self, user: &User, alert: &Alert) -> AppResult<EmailMessage> {
        let to = user
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                AppError::external_service(format!("user {} has no email address", user.username))
            })?;

        Ok(EmailMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject: format!("[{}] {}", alert.severity, alert.title),
            body: format!(
                "{}\n\nThis alert is active until {}.",
                alert.message,
                alert.expiry_time.format("%Y-%m-%d %H:%M UTC")
            ),
        })
    }
}

#[async_trait]
impl Transport for EmailChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn attempt(&self, user: &User, alert: &Alert) -> AppResult<()> {
        let email = self.render(user, alert)?;
        info!(
            channel = "Email",
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            alert_id = %alert.id,
            "Email alert handed off"
        );
        Ok(())
    }
}

/// A rendered text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    /// Recipient number.
    pub to: String,
    /// Message text, at most the configured length in characters.
    pub text: String,
}

/// Outbound SMS.
#[derive(Debug, Clone)]
pub struct SmsChannel {
    max_length: usize,
}

impl SmsChannel {
    /// Creates an SMS channel truncating bodies to `max_length` characters.
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Render the text for `user`. Users without a number cannot be reached.
    pub fn render(&self, user: &User, alert: &Alert) -> AppResult<SmsMessage> {
        let to = user
            .phone_number
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                AppError::external_service(format!("user {} has no phone number", user.username))
            })?;

        let full = format!("{}: {}", alert.title, alert.message);
        let text = if full.chars().count() > self.max_length {
            let mut cut: String = full.chars().take(self.max_length.saturating_sub(3)).collect();
            cut.push_str("...");
            cut
        } else {
            full
        };

        Ok(SmsMessage {
            to: to.to_string(),
            text,
        })
    }
}

#[async_trait]
impl Transport for SmsChannel {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    async fn attempt(&self, user: &User, alert: &Alert) -> AppResult<()> {
        let sms = self.render(user, alert)?;
        info!(
            channel = "SMS",
            to = %sms.to,
            length = sms.text.chars().count(),
            alert_id = %alert.id,
            "SMS alert handed off"
        );
        Ok(())
    }
}
