//! PostgreSQL implementation of the record store.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewShortLink, ShortLink, ShortLinkPatch};
use crate::domain::repositories::RecordStore;
use crate::error::AppError;
use crate::utils::db_error::map_insert_error;

/// Column list shared by every query that returns full records.
const COLUMNS: &str = "id, target_url, short_code, custom_alias, created_at, updated_at, \
     expires_at, is_active, click_count, last_accessed_at, creator_ip, user_agent, description";

/// PostgreSQL store for short link records.
///
/// Uniqueness of `short_code` and `custom_alias` is enforced by the table's
/// unique constraints; concurrent writers racing on the same key are
/// serialized by the database, never by application-level locking. All
/// mutations are single atomic statements.
pub struct PgRecordStore {
    pool: Arc<PgPool>,
}

impl PgRecordStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Pings the database. Used by health check endpoints.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await
            .is_ok()
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let sql = format!(
            "INSERT INTO short_links \
                 (target_url, short_code, custom_alias, expires_at, creator_ip, user_agent, description) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, ShortLink>(&sql)
            .bind(&new_link.target_url)
            .bind(&new_link.short_code)
            .bind(&new_link.custom_alias)
            .bind(new_link.expires_at)
            .bind(&new_link.creator_ip)
            .bind(&new_link.user_agent)
            .bind(&new_link.description)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                map_insert_error(e, &new_link.short_code, new_link.custom_alias.as_deref())
            })
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM short_links WHERE short_code = $1");

        let link = sqlx::query_as::<_, ShortLink>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<ShortLink>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM short_links WHERE custom_alias = $1");

        let link = sqlx::query_as::<_, ShortLink>(&sql)
            .bind(alias)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn find_by_target(&self, target_url: &str) -> Result<Option<ShortLink>, AppError> {
        // Newest match wins when a target was shortened more than once
        // before the dedup policy was enabled.
        let sql = format!(
            "SELECT {COLUMNS} FROM short_links \
             WHERE target_url = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );

        let link = sqlx::query_as::<_, ShortLink>(&sql)
            .bind(target_url)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn update(&self, id: i64, patch: ShortLinkPatch) -> Result<Option<ShortLink>, AppError> {
        let sql = format!(
            "UPDATE short_links SET \
                 target_url = COALESCE($2, target_url), \
                 description = CASE WHEN $3 THEN $4 ELSE description END, \
                 expires_at = CASE WHEN $5 THEN $6 ELSE expires_at END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );

        let link = sqlx::query_as::<_, ShortLink>(&sql)
            .bind(id)
            .bind(&patch.target_url)
            .bind(patch.description.is_some())
            .bind(patch.description.clone().flatten())
            .bind(patch.expires_at.is_some())
            .bind(patch.expires_at.flatten())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn increment_click(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE short_links SET \
                 click_count = click_count + 1, \
                 last_accessed_at = NOW(), \
                 updated_at = NOW() \
             WHERE short_code = $1",
        )
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn deactivate(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE short_links SET is_active = FALSE, updated_at = NOW() \
             WHERE short_code = $1",
        )
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, code: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM short_links WHERE short_code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        offset: i64,
        limit: i64,
        is_active: Option<bool>,
    ) -> Result<Vec<ShortLink>, AppError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM short_links \
             WHERE ($1::boolean IS NULL OR is_active = $1) \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );

        let links = sqlx::query_as::<_, ShortLink>(&sql)
            .bind(is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(links)
    }

    async fn count(&self, is_active: Option<bool>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM short_links \
             WHERE ($1::boolean IS NULL OR is_active = $1)",
        )
        .bind(is_active)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn deactivate_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE short_links SET is_active = FALSE, updated_at = NOW() \
             WHERE expires_at IS NOT NULL \
               AND expires_at < NOW() \
               AND is_active = TRUE",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
