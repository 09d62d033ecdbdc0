//! Business logic services.

mod link_service;

pub use link_service::{LinkPolicy, LinkService};
