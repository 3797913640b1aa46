//! # alerthub-entity
//!
//! Domain entity models for AlertHub. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod alert;
pub mod delivery;
pub mod preference;
pub mod team;
pub mod user;
