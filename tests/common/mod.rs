#![allow(dead_code)]

//! In-memory doubles for the two storage collaborators, plus wiring
//! helpers. The doubles reproduce the store-level semantics the real
//! backends provide: uniqueness constraints, atomic increments, and
//! per-entry TTLs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use linkcut::application::services::{LinkPolicy, LinkService};
use linkcut::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use linkcut::domain::repositories::RecordStore;
use linkcut::error::AppError;
use linkcut::infrastructure::cache::{CacheError, CacheResult, CacheStore};
use linkcut::infrastructure::persistence::CachedLinkRepository;

/// In-memory record store with the same constraint semantics as Postgres:
/// unique `short_code` and `custom_alias`, row-level atomic mutations.
#[derive(Default)]
pub struct MemoryRecordStore {
    rows: Mutex<Vec<ShortLink>>,
    next_id: AtomicI64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let mut rows = self.rows.lock().unwrap();

        if rows.iter().any(|r| r.short_code == new_link.short_code) {
            return Err(AppError::CodeConflict {
                code: new_link.short_code,
            });
        }

        if let Some(alias) = &new_link.custom_alias
            && rows
                .iter()
                .any(|r| r.custom_alias.as_deref() == Some(alias.as_str()))
        {
            return Err(AppError::AliasConflict {
                alias: alias.clone(),
            });
        }

        let now = Utc::now();
        let link = ShortLink {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            target_url: new_link.target_url,
            short_code: new_link.short_code,
            custom_alias: new_link.custom_alias,
            created_at: now,
            updated_at: now,
            expires_at: new_link.expires_at,
            is_active: true,
            click_count: 0,
            last_accessed_at: None,
            creator_ip: new_link.creator_ip,
            user_agent: new_link.user_agent,
            description: new_link.description,
        };

        rows.push(link.clone());
        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.short_code == code).cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.custom_alias.as_deref() == Some(alias))
            .cloned())
    }

    async fn find_by_target(&self, target_url: &str) -> Result<Option<ShortLink>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.target_url == target_url)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn update(&self, id: i64, patch: ShortLinkPatch) -> Result<Option<ShortLink>, AppError> {
        let mut rows = self.rows.lock().unwrap();

        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if let Some(target_url) = patch.target_url {
            row.target_url = target_url;
        }
        if let Some(description) = patch.description {
            row.description = description;
        }
        if let Some(expires_at) = patch.expires_at {
            row.expires_at = expires_at;
        }
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn increment_click(&self, code: &str) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();

        let Some(row) = rows.iter_mut().find(|r| r.short_code == code) else {
            return Ok(false);
        };

        row.click_count += 1;
        row.last_accessed_at = Some(Utc::now());
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn deactivate(&self, code: &str) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();

        let Some(row) = rows.iter_mut().find(|r| r.short_code == code) else {
            return Ok(false);
        };

        row.is_active = false;
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.short_code != code);
        Ok(rows.len() < before)
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<ShortLink>, AppError> {
        let rows = self.rows.lock().unwrap();

        let mut matching: Vec<ShortLink> = rows
            .iter()
            .filter(|r| is_active.is_none_or(|active| r.is_active == active))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, is_active: Option<bool>) -> Result<i64, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| is_active.is_none_or(|active| r.is_active == active))
            .count() as i64)
    }

    async fn deactivate_expired(&self) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let mut flipped = 0;

        for row in rows.iter_mut() {
            if row.is_active && row.expires_at.is_some_and(|e| e < now) {
                row.is_active = false;
                row.updated_at = now;
                flipped += 1;
            }
        }

        Ok(flipped)
    }
}

/// In-memory cache with per-entry TTLs.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries
            .values()
            .filter(|(_, deadline)| deadline.is_none_or(|d| d > Instant::now()))
            .count()
    }

    pub fn contains(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .is_some_and(|(_, deadline)| deadline.is_none_or(|d| d > Instant::now()))
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().unwrap();

        match entries.get(key) {
            Some((_, Some(deadline))) if *deadline <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let deadline = ttl_seconds.map(|ttl| Instant::now() + Duration::from_secs(ttl));
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.contains(key))
    }

    async fn increment(&self, key: &str, amount: i64) -> CacheResult<Option<i64>> {
        let mut entries = self.entries.lock().unwrap();

        let current = entries
            .get(key)
            .and_then(|(value, _)| value.parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + amount;
        entries.insert(key.to_string(), (next.to_string(), None));

        Ok(Some(next))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap();

        if let Some((value, _)) = entries.remove(&key.to_string()) {
            entries.insert(
                key.to_string(),
                (value, Some(Instant::now() + Duration::from_secs(ttl_seconds))),
            );
        }

        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// A cache that fails every operation, for proving the repository absorbs
/// cache outages without surfacing them.
pub struct FlakyCache;

#[async_trait]
impl CacheStore for FlakyCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::OperationError("cache down".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl_seconds: Option<u64>) -> CacheResult<()> {
        Err(CacheError::OperationError("cache down".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::OperationError("cache down".into()))
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Err(CacheError::OperationError("cache down".into()))
    }

    async fn increment(&self, _key: &str, _amount: i64) -> CacheResult<Option<i64>> {
        Err(CacheError::OperationError("cache down".into()))
    }

    async fn expire(&self, _key: &str, _ttl_seconds: u64) -> CacheResult<()> {
        Err(CacheError::OperationError("cache down".into()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

pub type TestRepository = CachedLinkRepository<MemoryRecordStore>;

/// Builds a repository over fresh in-memory doubles, returning handles to
/// both collaborators for direct manipulation in tests.
pub fn create_test_repository() -> (Arc<TestRepository>, Arc<MemoryRecordStore>, Arc<MemoryCache>) {
    let store = Arc::new(MemoryRecordStore::new());
    let cache = Arc::new(MemoryCache::new());
    let repository = Arc::new(CachedLinkRepository::new(
        Arc::clone(&store),
        cache.clone() as Arc<dyn CacheStore>,
        3600,
    ));

    (repository, store, cache)
}

/// Builds a full service stack over in-memory doubles.
pub fn create_test_service(
    policy: LinkPolicy,
) -> (
    LinkService<TestRepository>,
    Arc<TestRepository>,
    Arc<MemoryRecordStore>,
    Arc<MemoryCache>,
) {
    let (repository, store, cache) = create_test_repository();
    let service = LinkService::new(Arc::clone(&repository), policy);

    (service, repository, store, cache)
}

/// Insert payload with fixed code and sensible defaults.
pub fn new_link(code: &str, target: &str) -> NewShortLink {
    NewShortLink {
        target_url: target.to_string(),
        short_code: code.to_string(),
        custom_alias: None,
        expires_at: None,
        creator_ip: None,
        user_agent: None,
        description: None,
    }
}
