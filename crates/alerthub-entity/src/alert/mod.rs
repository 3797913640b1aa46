//! Alert domain entities.

pub mod channel;
pub mod model;
pub mod severity;
pub mod visibility;

pub use channel::DeliveryChannel;
pub use model::{Alert, NewAlert};
pub use severity::Severity;
pub use visibility::{AudienceScope, Visibility};
