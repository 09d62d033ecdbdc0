//! Maintenance entry point.
//!
//! The transport layer lives elsewhere; this binary wires the stores
//! together, applies migrations, and runs the periodic expired-link sweep
//! until interrupted.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use linkcut::application::services::{LinkPolicy, LinkService};
use linkcut::config::{self, Config};
use linkcut::infrastructure::cache::{CacheStore, NullCache, RedisCache};
use linkcut::infrastructure::persistence::{CachedLinkRepository, PgRecordStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    init_tracing(&config);
    config.print_summary();

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let cache: Arc<dyn CacheStore> = if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(
            redis_url,
            config.cache_ttl_seconds,
            config.cache_op_timeout_ms,
        )
        .await
        {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    };

    let store = Arc::new(PgRecordStore::new(Arc::new(pool)));
    let repository = Arc::new(CachedLinkRepository::new(
        store,
        cache,
        config.cache_ttl_seconds,
    ));
    let service = LinkService::new(repository, LinkPolicy::from_config(&config));

    tracing::info!(
        "Expired-link sweeper running every {}s",
        config.cleanup_interval_seconds
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(config.cleanup_interval_seconds));
    // The first tick fires immediately; a fresh boot sweeps right away.
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service.cleanup_expired().await {
                    Ok(flipped) => {
                        tracing::debug!("Sweep complete, {} links deactivated", flipped);
                    }
                    Err(e) => {
                        tracing::error!("Expired-link sweep failed: {}", e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping sweeper");
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
