//! Short link allocation and resolution service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::config::Config;
use crate::domain::entities::{NewShortLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::dto::{
    CreateLinkRequest, LinkListResponse, LinkResponse, LinkStatsResponse, PageParams, RequestMeta,
};
use crate::error::AppError;
use crate::utils::code_generator::CodeGenerator;
use crate::utils::url_validator::UrlValidator;

/// Attempts per generation round before the code length is escalated.
/// Two rounds are allowed in total; exhausting both is a fatal condition.
const MAX_GENERATION_ATTEMPTS: usize = 100;

/// Business rules the service applies on top of storage constraints.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    /// Public base for assembled short URLs.
    pub base_url: String,
    /// Length of generated short codes.
    pub short_code_length: usize,
    /// Target URL length ceiling.
    pub max_url_length: usize,
    /// Process-wide default expiry, `None` when links never expire by
    /// default. A per-request override always wins.
    pub default_expiry_days: Option<u32>,
    /// When true, an already-shortened normalized target returns its
    /// existing active record instead of allocating a new code.
    pub dedup_by_target: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            short_code_length: 6,
            max_url_length: 2048,
            default_expiry_days: None,
            dedup_by_target: false,
        }
    }
}

impl LinkPolicy {
    /// Derives the policy from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            short_code_length: config.short_code_length,
            max_url_length: config.max_url_length,
            default_expiry_days: config.default_expiry_days(),
            dedup_by_target: config.dedup_by_target,
        }
    }
}

/// Service orchestrating code generation, URL validation, and the
/// repository for the public short link operations.
///
/// Owns every record lifecycle decision; the repository beneath it owns
/// physical storage and cache mediation, and nothing else mutates either
/// store directly.
pub struct LinkService<R> {
    repository: Arc<R>,
    generator: CodeGenerator,
    validator: UrlValidator,
    policy: LinkPolicy,
}

impl<R: LinkRepository + 'static> LinkService<R> {
    /// Creates a new link service.
    pub fn new(repository: Arc<R>, policy: LinkPolicy) -> Self {
        let generator = CodeGenerator::new(policy.short_code_length);
        let validator = UrlValidator::new(policy.max_url_length);

        Self {
            repository,
            generator,
            validator,
            policy,
        }
    }

    /// Creates a short link.
    ///
    /// The target is normalized and validated before any store access. A
    /// requested custom alias is reserved atomically and never retried on
    /// conflict; otherwise a random code is allocated with a bounded retry
    /// loop that escalates the code length once before giving up.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for malformed request parameters
    /// - [`AppError::TargetTooLong`] / [`AppError::InvalidTarget`] for
    ///   rejected targets
    /// - [`AppError::AliasConflict`] when the requested alias is taken
    /// - [`AppError::GenerationExhausted`] when both generation rounds
    ///   run out of attempts
    pub async fn create_short_link(
        &self,
        request: CreateLinkRequest,
        meta: RequestMeta,
    ) -> Result<LinkResponse, AppError> {
        request
            .validate()
            .map_err(|e| AppError::validation(e.to_string()))?;

        let normalized = self.validator.normalize(&request.target_url);

        if normalized.len() > self.policy.max_url_length {
            return Err(AppError::TargetTooLong {
                max: self.policy.max_url_length,
            });
        }

        if !self.validator.is_valid(&normalized) {
            return Err(AppError::invalid_target(normalized));
        }

        if self.policy.dedup_by_target
            && let Some(existing) = self.repository.find_by_target(&normalized).await?
            && existing.is_resolvable()
        {
            debug!(
                "Returning existing link {} for target {}",
                existing.short_code, normalized
            );
            return Ok(LinkResponse::from_link(&existing, &self.policy.base_url));
        }

        let new_link = NewShortLink {
            target_url: normalized,
            // Filled in by alias reservation or the allocation loop.
            short_code: String::new(),
            custom_alias: request.custom_alias.clone(),
            expires_at: self.compute_expiry(request.expires_in_days),
            creator_ip: meta.ip,
            user_agent: meta.user_agent,
            description: request.description.clone(),
        };

        let link = match &request.custom_alias {
            Some(alias) => self.reserve_custom_alias(alias, new_link).await?,
            None => self.allocate_random_code(new_link).await?,
        };

        info!("Created short link {} -> {}", link.short_code, link.target_url);
        Ok(LinkResponse::from_link(&link, &self.policy.base_url))
    }

    /// Resolves a short code (or custom alias) to its target URL.
    ///
    /// Deactivated records answer exactly like missing ones, so callers
    /// cannot distinguish "deactivated" from "never existed". An active
    /// record past its expiry is the distinct [`AppError::Expired`].
    ///
    /// Click accounting runs off the resolution path: a counter failure is
    /// logged and never turns a successful resolution into an error.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        let link = self
            .lookup(code)
            .await?
            .ok_or_else(|| AppError::not_found(code))?;

        if !link.is_active {
            return Err(AppError::not_found(code));
        }

        if link.is_expired() {
            return Err(AppError::expired(code));
        }

        let repository = Arc::clone(&self.repository);
        let clicked = link.short_code.clone();
        tokio::spawn(async move {
            match repository.increment_click(&clicked).await {
                Ok(true) => {}
                Ok(false) => warn!("Click increment matched no record for {}", clicked),
                Err(e) => warn!("Click increment failed for {}: {}", clicked, e),
            }
        });

        debug!("Resolved {} -> {}", code, link.target_url);
        Ok(link.target_url)
    }

    /// Returns the detailed projection for a code or alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when no record matches.
    pub async fn get_info(&self, code: &str) -> Result<LinkStatsResponse, AppError> {
        let link = self
            .lookup(code)
            .await?
            .ok_or_else(|| AppError::not_found(code))?;

        Ok(LinkStatsResponse::from_link(&link, &self.policy.base_url))
    }

    /// Lists links with pagination and an optional active-flag filter.
    pub async fn list(&self, params: PageParams) -> Result<LinkListResponse, AppError> {
        let (offset, limit) = params
            .validate_and_get_offset_limit()
            .map_err(AppError::validation)?;

        let total = self.repository.count(params.is_active).await?;
        let links = self.repository.list(offset, limit, params.is_active).await?;

        Ok(LinkListResponse {
            urls: links
                .iter()
                .map(|link| LinkResponse::from_link(link, &self.policy.base_url))
                .collect(),
            total,
            page: params.page.unwrap_or(1),
            size: params.size.unwrap_or(10),
            pages: (total + limit - 1) / limit,
        })
    }

    /// Deactivates a link. One-way: there is no reactivation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when no record matches the code.
    pub async fn deactivate(&self, code: &str) -> Result<bool, AppError> {
        if self.repository.get_by_code(code).await?.is_none() {
            return Err(AppError::not_found(code));
        }

        let changed = self.repository.deactivate(code).await?;
        if changed {
            info!("Deactivated short link {}", code);
        }

        Ok(changed)
    }

    /// Hard-deletes a link, evicting any cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] when no record matches the code.
    pub async fn delete(&self, code: &str) -> Result<bool, AppError> {
        if self.repository.get_by_code(code).await?.is_none() {
            return Err(AppError::not_found(code));
        }

        let deleted = self.repository.delete(code).await?;
        if deleted {
            info!("Deleted short link {}", code);
        }

        Ok(deleted)
    }

    /// Bulk-flips expired-but-active links to inactive.
    ///
    /// The only operation allowed to mutate multiple records in one pass.
    /// Idempotent: a second run with no new expirations flips zero rows.
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let flipped = self.repository.deactivate_expired().await?;

        if flipped > 0 {
            info!("Deactivated {} expired short links", flipped);
        }

        Ok(flipped)
    }

    /// Code lookup with alias fallback.
    async fn lookup(&self, key: &str) -> Result<Option<ShortLink>, AppError> {
        if let Some(link) = self.repository.get_by_code(key).await? {
            return Ok(Some(link));
        }

        self.repository.get_by_alias(key).await
    }

    /// Reserves a caller-chosen alias as the record's short code.
    ///
    /// The availability check is advisory; the store's uniqueness
    /// constraint resolves a reservation race, and the losing writer's
    /// conflict is final - custom aliases are never retried.
    async fn reserve_custom_alias(
        &self,
        alias: &str,
        mut new_link: NewShortLink,
    ) -> Result<ShortLink, AppError> {
        if self.repository.get_by_alias(alias).await?.is_some() {
            return Err(AppError::AliasConflict {
                alias: alias.to_string(),
            });
        }

        new_link.short_code = alias.to_string();
        self.repository.create(new_link).await
    }

    /// Bounded allocation loop for random codes.
    ///
    /// Each candidate is pre-checked with a lookup and then offered to the
    /// store; losing the insert race to a concurrent writer consumes an
    /// attempt like any other collision. After a full round of collisions
    /// the code length is escalated once; exhausting both rounds raises
    /// the fatal, user-visible [`AppError::GenerationExhausted`].
    async fn allocate_random_code(&self, new_link: NewShortLink) -> Result<ShortLink, AppError> {
        let base_length = self.generator.length();

        for length in [base_length, base_length + 1] {
            if length > base_length {
                warn!(
                    "Escalating code length to {} after {} collisions",
                    length, MAX_GENERATION_ATTEMPTS
                );
            }

            for _ in 0..MAX_GENERATION_ATTEMPTS {
                let code = self.generator.generate_random_with_length(length);

                if self.repository.get_by_code(&code).await?.is_some() {
                    continue;
                }

                let mut attempt = new_link.clone();
                attempt.short_code = code;

                match self.repository.create(attempt).await {
                    Ok(link) => return Ok(link),
                    Err(AppError::CodeConflict { .. }) => continue,
                    Err(e) => return Err(e),
                }
            }
        }

        error!(
            "Short code generation exhausted after {} attempts",
            2 * MAX_GENERATION_ATTEMPTS
        );
        Err(AppError::GenerationExhausted)
    }

    /// Expiry from the per-request override, else the default policy.
    fn compute_expiry(&self, override_days: Option<u32>) -> Option<DateTime<Utc>> {
        let days = override_days.or(self.policy.default_expiry_days)?;
        Some(Utc::now() + Duration::days(i64::from(days)))
    }
}
