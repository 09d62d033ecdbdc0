//! Durable store trait for short link records.

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::error::AppError;
use async_trait::async_trait;

/// The authoritative, durable store of short link records.
///
/// Implementations are expected to enforce uniqueness of `short_code` and
/// `custom_alias` with native constraints and to perform all mutations
/// atomically at the row level; callers never take application-level locks.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRecordStore`] - PostgreSQL implementation
/// - In-memory doubles in the integration test suite
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record in a single atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeConflict`] or [`AppError::AliasConflict`]
    /// when the respective uniqueness constraint is violated, identifying
    /// which field conflicted. Returns [`AppError::StoreUnavailable`] on
    /// other store failures.
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError>;

    /// Finds a record by its short code.
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError>;

    /// Finds a record by its custom alias.
    async fn find_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, AppError>;

    /// Finds a record by its normalized target URL. Used by the optional
    /// dedup-by-target policy.
    async fn find_by_target(&self, target_url: &str) -> Result<Option<ShortLink>, AppError>;

    /// Applies a partial update and returns the fresh record, or `None`
    /// when no record matches `id`.
    async fn update(&self, id: i64, patch: ShortLinkPatch) -> Result<Option<ShortLink>, AppError>;

    /// Atomically increments the click counter and touches the last-access
    /// timestamp at the store level. Never read-modify-write: concurrent
    /// resolutions of the same code must not lose updates.
    ///
    /// Returns `false` when no record matches the code.
    async fn increment_click(&self, code: &str) -> Result<bool, AppError>;

    /// Flips `is_active` to false. Returns `false` when no record matches.
    async fn deactivate(&self, code: &str) -> Result<bool, AppError>;

    /// Hard-deletes the record. Returns `false` when no record matches.
    async fn delete(&self, code: &str) -> Result<bool, AppError>;

    /// Lists records ordered by creation time (newest first), optionally
    /// filtered by active flag.
    async fn list(
        &self,
        offset: i64,
        limit: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<ShortLink>, AppError>;

    /// Counts records, optionally filtered by active flag.
    async fn count(&self, is_active: Option<bool>) -> Result<i64, AppError>;

    /// Bulk-flips every record whose expiry has passed and is still active.
    /// Idempotent: a second run with no new expirations touches zero rows.
    ///
    /// Returns the number of rows flipped.
    async fn deactivate_expired(&self) -> Result<u64, AppError>;
}
