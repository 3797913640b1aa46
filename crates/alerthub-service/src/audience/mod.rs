//! Audience resolution.

pub mod resolver;

pub use resolver::AudienceResolver;
