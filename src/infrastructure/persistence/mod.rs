//! Durable storage implementations and cache mediation.

mod cached_repository;
mod pg_record_store;

pub use cached_repository::CachedLinkRepository;
pub use pg_record_store::PgRecordStore;
