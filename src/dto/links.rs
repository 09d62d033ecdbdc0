//! Request and response shapes exchanged with the transport layer.
//!
//! The crate does not own an HTTP surface; these are the projections the
//! hosting layer feeds in and gets back. Field-level validation here covers
//! only shape (lengths, ranges) - semantic URL validation lives in
//! [`crate::utils::url_validator`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::domain::entities::ShortLink;

/// Hard cap on page size for list operations.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Request to create a short link.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLinkRequest {
    /// The target URL to shorten. Normalized before persistence.
    #[validate(length(min = 1, max = 8192))]
    pub target_url: String,

    /// Optional caller-chosen alias. Reserved atomically; never retried on
    /// conflict.
    #[validate(length(min = 3, max = 50))]
    pub custom_alias: Option<String>,

    /// Optional free-form description, informational only.
    #[validate(length(max = 500))]
    pub description: Option<String>,

    /// Per-request expiry override in days. Absent means the process-wide
    /// default policy applies.
    #[validate(range(min = 1, max = 3650))]
    pub expires_in_days: Option<u32>,
}

/// Caller metadata captured alongside a creation request.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Record projection returned for created and listed links.
#[derive(Debug, Clone, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub target_url: String,
    pub short_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub click_count: i64,
    pub description: Option<String>,
    pub custom_alias: Option<String>,
}

impl LinkResponse {
    /// Builds the projection, assembling the public short URL from the
    /// configured base.
    pub fn from_link(link: &ShortLink, base_url: &str) -> Self {
        Self {
            id: link.id,
            target_url: link.target_url.clone(),
            short_url: format!("{}/{}", base_url.trim_end_matches('/'), link.short_code),
            short_code: link.short_code.clone(),
            created_at: link.created_at,
            expires_at: link.expires_at,
            is_active: link.is_active,
            click_count: link.click_count,
            description: link.description.clone(),
            custom_alias: link.custom_alias.clone(),
        }
    }
}

/// Detailed projection for the info/stats operation.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStatsResponse {
    pub id: i64,
    pub target_url: String,
    pub short_url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_expired: bool,
    pub click_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub custom_alias: Option<String>,
}

impl LinkStatsResponse {
    pub fn from_link(link: &ShortLink, base_url: &str) -> Self {
        Self {
            id: link.id,
            target_url: link.target_url.clone(),
            short_url: format!("{}/{}", base_url.trim_end_matches('/'), link.short_code),
            short_code: link.short_code.clone(),
            created_at: link.created_at,
            updated_at: link.updated_at,
            expires_at: link.expires_at,
            is_active: link.is_active,
            is_expired: link.is_expired(),
            click_count: link.click_count,
            last_accessed_at: link.last_accessed_at,
            description: link.description.clone(),
            custom_alias: link.custom_alias.clone(),
        }
    }
}

/// Pagination and filtering parameters for list operations.
///
/// Uses `serde_with` to accept page numbers arriving as query-string text.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub size: Option<u32>,

    #[serde(default)]
    pub is_active: Option<bool>,
}

impl PageParams {
    /// Validates pagination parameters and converts to database offset/limit.
    ///
    /// # Defaults
    ///
    /// - `page`: 1
    /// - `size`: 10
    ///
    /// # Validation
    ///
    /// - Page must be ≥ 1
    /// - Size must be between 1 and [`MAX_PAGE_SIZE`]
    ///
    /// # Returns
    ///
    /// `(offset, limit)` tuple for store queries.
    pub fn validate_and_get_offset_limit(&self) -> Result<(i64, i64), String> {
        let page = self.page.unwrap_or(1);
        let size = self.size.unwrap_or(10);

        if page == 0 {
            return Err("Page must be greater than 0".to_string());
        }

        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(format!("Size must be between 1 and {}", MAX_PAGE_SIZE));
        }

        let offset = ((page - 1) * size) as i64;
        let limit = size as i64;

        Ok((offset, limit))
    }
}

/// Paginated list of record projections.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub urls: Vec<LinkResponse>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
    pub pages: i64,
}
