//! Per-user, per-alert delivery preference.

pub mod model;

pub use model::{DeliveryPreference, end_of_local_day};
