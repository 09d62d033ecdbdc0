//! Short link entity and its write-side payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link record as stored in the record store.
///
/// Serializable because the cache layer stores the full projection as JSON.
/// The cache copy is disposable: the record store stays authoritative and a
/// missing or stale cache entry is always recoverable from it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShortLink {
    pub id: i64,
    pub target_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub click_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub creator_ip: Option<String>,
    pub user_agent: Option<String>,
    pub description: Option<String>,
}

impl ShortLink {
    /// Returns true if the link has passed its expiry time.
    ///
    /// Expiry is a derived predicate evaluated at read time, never a stored
    /// flag: a record can be expired while `is_active` is still true.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|e| Utc::now() > e)
    }

    /// Returns true if a resolution may follow this record to its target.
    pub fn is_resolvable(&self) -> bool {
        self.is_active && !self.is_expired()
    }
}

/// Input data for creating a new short link.
#[derive(Debug, Clone)]
pub struct NewShortLink {
    pub target_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub creator_ip: Option<String>,
    pub user_agent: Option<String>,
    pub description: Option<String>,
}

/// Partial update for an existing short link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
/// The short code itself is immutable and cannot be patched.
#[derive(Debug, Clone, Default)]
pub struct ShortLinkPatch {
    pub target_url: Option<String>,
    pub description: Option<Option<String>>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}
