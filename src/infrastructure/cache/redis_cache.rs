//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Redis cache implementation for short link projections.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection
/// reuse. All operations are fail-open: errors and timeouts are logged but
/// never propagate to callers. The per-operation timeout is deliberately
/// short and independent of the record store's timeouts, so a cache outage
/// costs the read path at most one extra record-store round trip.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and
    /// configures the default TTL and per-operation timeout.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied when [`CacheStore::set`] is
    ///   called with `ttl_seconds = None`; controlled via `CACHE_TTL_SECONDS`
    /// - `op_timeout_ms` - Per-operation time limit; controlled via
    ///   `CACHE_OP_TIMEOUT_MS`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the
    /// connection cannot be established, or the PING health check fails.
    pub async fn connect(
        redis_url: &str,
        default_ttl_seconds: u64,
        op_timeout_ms: u64,
    ) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            op_timeout: Duration::from_millis(op_timeout_ms),
        })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();

        match timeout(self.op_timeout, conn.get::<_, Option<String>>(key)).await {
            Ok(Ok(Some(value))) => {
                debug!("Cache HIT: {}", key);
                Ok(Some(value))
            }
            Ok(Ok(None)) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Ok(Err(e)) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
            Err(_) => {
                warn!("Redis GET timed out for {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        match timeout(self.op_timeout, conn.set_ex::<_, _, ()>(key, value, ttl)).await {
            Ok(Ok(())) => {
                debug!("Cache SET: {} (TTL: {}s)", key, ttl);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Redis SET error for {}: {}", key, e);
                Ok(())
            }
            Err(_) => {
                warn!("Redis SET timed out for {}", key);
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        match timeout(self.op_timeout, conn.del::<_, i32>(key)).await {
            Ok(Ok(deleted)) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", key);
                }
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Redis DEL error for {}: {}", key, e);
                Ok(())
            }
            Err(_) => {
                warn!("Redis DEL timed out for {}", key);
                Ok(())
            }
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.client.clone();

        match timeout(self.op_timeout, conn.exists::<_, bool>(key)).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(e)) => {
                error!("Redis EXISTS error for {}: {}", key, e);
                Ok(false)
            }
            Err(_) => {
                warn!("Redis EXISTS timed out for {}", key);
                Ok(false)
            }
        }
    }

    async fn increment(&self, key: &str, amount: i64) -> CacheResult<Option<i64>> {
        let mut conn = self.client.clone();

        match timeout(self.op_timeout, conn.incr::<_, _, i64>(key, amount)).await {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(e)) => {
                warn!("Redis INCRBY error for {}: {}", key, e);
                Ok(None)
            }
            Err(_) => {
                warn!("Redis INCRBY timed out for {}", key);
                Ok(None)
            }
        }
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> CacheResult<()> {
        let mut conn = self.client.clone();

        match timeout(
            self.op_timeout,
            conn.expire::<_, bool>(key, ttl_seconds as i64),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => {
                warn!("Redis EXPIRE error for {}: {}", key, e);
                Ok(())
            }
            Err(_) => {
                warn!("Redis EXPIRE timed out for {}", key);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        matches!(timeout(self.op_timeout, conn.ping::<()>()).await, Ok(Ok(())))
    }
}
