//! Repository trait for short link data access with cache mediation.

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for managing short links.
///
/// This is the only capability permitted to touch both the record store and
/// the cache; it owns the cache-aside protocol between them. Cache failures
/// are absorbed here and never surface to callers, since the record store is
/// authoritative.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::CachedLinkRepository`] - record
///   store plus cache-aside mediation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// On success the cache is populated for the new code with a bounded
    /// TTL independent of the record's own expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeConflict`] / [`AppError::AliasConflict`]
    /// when a uniqueness constraint fires - the caller decides whether to
    /// retry (random codes) or fail outright (custom aliases).
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Looks up a record by short code, cache first.
    ///
    /// A cache hit returns without touching the record store; a miss falls
    /// through and populates the cache on the way back. Negative results
    /// are never cached, so a subsequent creation under the same code is
    /// immediately visible.
    async fn get_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Looks up a record by custom alias, always against the record store.
    /// Aliases are not cached; this is the fallback when code lookup misses.
    async fn get_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, AppError>;

    /// Looks up a record by its normalized target URL (dedup hook).
    async fn find_by_target(&self, target_url: &str) -> Result<Option<ShortLink>, AppError>;

    /// Atomic update-and-return. On success the cache is **repopulated**
    /// with the fresh record (write-through) so a concurrent reader never
    /// observes a gap.
    async fn update(&self, id: i64, patch: ShortLinkPatch) -> Result<Option<ShortLink>, AppError>;

    /// Store-level atomic click increment plus timestamp touch. On success
    /// the cache entry is **invalidated** (not repopulated): click counts
    /// are read-mostly and the next read repopulates on demand.
    async fn increment_click(&self, code: &str) -> Result<bool, AppError>;

    /// Deactivates the record and invalidates its cache entry.
    async fn deactivate(&self, code: &str) -> Result<bool, AppError>;

    /// Hard-deletes the record and invalidates its cache entry.
    async fn delete(&self, code: &str) -> Result<bool, AppError>;

    /// Lists records ordered by creation time (newest first).
    async fn list(
        &self,
        offset: i64,
        limit: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<ShortLink>, AppError>;

    /// Counts records, optionally filtered by active flag.
    async fn count(&self, is_active: Option<bool>) -> Result<i64, AppError>;

    /// Bulk-flips expired-but-active records to inactive. Idempotent.
    async fn deactivate_expired(&self) -> Result<u64, AppError>;
}
