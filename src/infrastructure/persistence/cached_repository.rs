//! Cache-aside repository mediating between the record store and the cache.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::{LinkRepository, RecordStore};
use crate::error::AppError;
use crate::infrastructure::cache::CacheStore;

/// Namespace prefix for cached record projections.
const CACHE_KEY_PREFIX: &str = "url:";

fn cache_key(code: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{code}")
}

/// The only component permitted to touch both stores.
///
/// Reads consult the cache first and fall through to the record store on a
/// miss, repopulating the cache on the way back. Writes go to the record
/// store first, then either repopulate (update) or invalidate (click
/// accounting, deactivation, deletion) the cache entry.
///
/// Consistency contract: the record store is the single source of truth.
/// Cache failures of any kind are logged and treated as a miss/no-op, so
/// they never fail the overall operation. Record-store failures on read
/// paths are logged and degrade to "not found"; on write paths they
/// propagate as [`AppError::StoreUnavailable`].
pub struct CachedLinkRepository<S> {
    store: Arc<S>,
    cache: Arc<dyn CacheStore>,
    cache_ttl_seconds: u64,
}

impl<S: RecordStore> CachedLinkRepository<S> {
    /// Creates a repository over a record store and a cache.
    ///
    /// `cache_ttl_seconds` bounds the lifetime of cached projections,
    /// independently of any record's own `expires_at`.
    pub fn new(store: Arc<S>, cache: Arc<dyn CacheStore>, cache_ttl_seconds: u64) -> Self {
        Self {
            store,
            cache,
            cache_ttl_seconds,
        }
    }

    /// Writes a record projection into the cache. Failures are absorbed.
    async fn cache_put(&self, link: &ShortLink) {
        match serde_json::to_string(link) {
            Ok(json) => {
                let _ = self
                    .cache
                    .set(
                        &cache_key(&link.short_code),
                        &json,
                        Some(self.cache_ttl_seconds),
                    )
                    .await;
            }
            Err(e) => {
                warn!("Failed to serialize record {} for cache: {}", link.short_code, e);
            }
        }
    }

    /// Drops the cache entry for a code. Failures are absorbed.
    async fn cache_invalidate(&self, code: &str) {
        let _ = self.cache.delete(&cache_key(code)).await;
    }

    /// Reads a record projection from the cache. Corrupt entries are
    /// dropped and reported as a miss so the record store can repopulate.
    async fn cache_get(&self, code: &str) -> Option<ShortLink> {
        let json = self.cache.get(&cache_key(code)).await.ok().flatten()?;

        match serde_json::from_str(&json) {
            Ok(link) => {
                debug!("Repository cache hit for {}", code);
                Some(link)
            }
            Err(e) => {
                warn!("Corrupt cache entry for {}: {}", code, e);
                self.cache_invalidate(code).await;
                None
            }
        }
    }
}

#[async_trait]
impl<S: RecordStore> LinkRepository for CachedLinkRepository<S> {
    async fn create(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let link = self.store.insert(new_link).await?;
        self.cache_put(&link).await;
        Ok(link)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        if let Some(cached) = self.cache_get(code).await {
            return Ok(Some(cached));
        }

        match self.store.find_by_code(code).await {
            Ok(Some(link)) => {
                self.cache_put(&link).await;
                Ok(Some(link))
            }
            // Negative results are not cached: a creation under this code
            // must be visible to the very next lookup.
            Ok(None) => Ok(None),
            Err(e) => {
                error!("Record store lookup failed for {}: {}", code, e);
                Ok(None)
            }
        }
    }

    async fn get_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, AppError> {
        match self.store.find_by_alias(alias).await {
            Ok(link) => Ok(link),
            Err(e) => {
                error!("Record store alias lookup failed for {}: {}", alias, e);
                Ok(None)
            }
        }
    }

    async fn find_by_target(&self, target_url: &str) -> Result<Option<ShortLink>, AppError> {
        match self.store.find_by_target(target_url).await {
            Ok(link) => Ok(link),
            Err(e) => {
                error!("Record store target lookup failed: {}", e);
                Ok(None)
            }
        }
    }

    async fn update(&self, id: i64, patch: ShortLinkPatch) -> Result<Option<ShortLink>, AppError> {
        let updated = self.store.update(id, patch).await?;

        // Write-through: repopulate rather than invalidate, so a concurrent
        // reader never observes a gap between the two stores.
        if let Some(link) = &updated {
            self.cache_put(link).await;
        }

        Ok(updated)
    }

    async fn increment_click(&self, code: &str) -> Result<bool, AppError> {
        let touched = self.store.increment_click(code).await?;

        // Click counts are read-mostly; dropping the entry is enough. The
        // next read repopulates with the fresh count.
        if touched {
            self.cache_invalidate(code).await;
        }

        Ok(touched)
    }

    async fn deactivate(&self, code: &str) -> Result<bool, AppError> {
        let changed = self.store.deactivate(code).await?;
        self.cache_invalidate(code).await;
        Ok(changed)
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        let deleted = self.store.delete(code).await?;
        self.cache_invalidate(code).await;
        Ok(deleted)
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<ShortLink>, AppError> {
        self.store.list(offset, limit, is_active).await
    }

    async fn count(&self, is_active: Option<bool>) -> Result<i64, AppError> {
        self.store.count(is_active).await
    }

    async fn deactivate_expired(&self) -> Result<u64, AppError> {
        self.store.deactivate_expired().await
    }
}
