//! Cache store trait and error types.

use async_trait::async_trait;
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
    Timeout(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
            Self::Timeout(op) => write!(f, "Cache operation timed out: {}", op),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Volatile key-value store with per-entry TTLs.
///
/// Strictly advisory: the record store stays authoritative, so every
/// implementation must degrade gracefully. Production implementations are
/// fail-open - errors are logged and reported as a miss/no-op - and each
/// operation carries its own short timeout so a cache outage never inflates
/// the authoritative read path by more than one extra round trip.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed store
/// - [`crate::infrastructure::cache::NullCache`] - No-op for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Retrieves a value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` on hit
    /// - `Ok(None)` on miss or error (fail-open behavior)
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value with an optional TTL in seconds (implementation
    /// default when `None`).
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()>;

    /// Removes a key. Not an error if the key does not exist.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Checks whether a key currently exists.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Atomically increments a numeric value, returning the new value.
    /// `None` when the backend could not perform the increment.
    async fn increment(&self, key: &str, amount: i64) -> CacheResult<Option<i64>>;

    /// Sets the TTL of an existing key.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
