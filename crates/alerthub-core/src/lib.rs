//! # alerthub-core
//!
//! Core crate for AlertHub. Contains configuration schemas, the clock
//! abstraction, boundary timeout helpers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other AlertHub crates.

pub mod config;
pub mod error;
pub mod timeout;
pub mod traits;

pub use error::{AppError, AppResult};
pub use traits::clock::{Clock, ManualClock, SystemClock};
