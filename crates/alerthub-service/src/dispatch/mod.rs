//! Channel dispatch: one transport per delivery channel.

pub mod channels;
pub mod dispatcher;
pub mod outcome;

pub use channels::{EmailChannel, EmailMessage, InAppChannel, SmsChannel, SmsMessage, Transport};
pub use dispatcher::ChannelDispatcher;
pub use outcome::DeliveryOutcome;
