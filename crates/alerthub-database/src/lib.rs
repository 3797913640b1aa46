//! # alerthub-database
//!
//! Persistence for AlertHub: the store traits consumed by the delivery
//! engine, PostgreSQL repositories implementing them, and an in-memory
//! store with the same semantics for tests and local runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    AlertCounts, AlertDimension, AlertStore, DailyCount, DeliveryStore, DeliveryTotals,
    DirectoryStore, LabelCount, PreferenceStore, StatusCount, Stores,
};
