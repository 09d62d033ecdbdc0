//! Infrastructure layer: database, cache, and external integrations.

pub mod cache;
pub mod persistence;
