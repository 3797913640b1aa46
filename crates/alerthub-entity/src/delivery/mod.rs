//! Delivery log entities.

pub mod model;
pub mod status;

pub use model::DeliveryRecord;
pub use status::DeliveryStatus;
