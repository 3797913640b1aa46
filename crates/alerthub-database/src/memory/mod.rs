//! In-memory store for single-node demo runs and tests.

pub mod store;

pub use store::MemoryStore;
