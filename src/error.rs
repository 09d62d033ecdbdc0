//! Typed error taxonomy shared across the crate.
//!
//! Every user-visible failure mode is a distinct variant so callers can
//! branch on the kind without string matching: a deactivated link and a
//! missing link both surface as [`AppError::NotFound`], while an expired
//! link is a separate [`AppError::Expired`] condition.

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The target URL failed validation (scheme, host, block-list, ...).
    #[error("invalid target URL: '{url}'")]
    InvalidTarget { url: String },

    /// The target URL exceeds the configured maximum length.
    #[error("target URL must not exceed {max} characters")]
    TargetTooLong { max: usize },

    /// The requested custom alias is already taken. Never retried.
    #[error("custom alias '{alias}' already exists")]
    AliasConflict { alias: String },

    /// A generated short code collided with an existing record.
    /// The allocation loop retries these with a bounded attempt count.
    #[error("short code '{code}' already exists")]
    CodeConflict { code: String },

    /// Bounded code generation (including the one-step length escalation)
    /// ran out of attempts. Signals that the code space needs attention.
    #[error("could not allocate a unique short code")]
    GenerationExhausted,

    /// No resolvable record for the given key. Also covers deactivated
    /// records, which are indistinguishable from missing ones.
    #[error("short link '{code}' not found")]
    NotFound { code: String },

    /// The record exists and is active, but its expiry has passed.
    #[error("short link '{code}' has expired")]
    Expired { code: String },

    /// The record store failed on a write path.
    #[error("record store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A request parameter failed boundary validation (page, size, ...).
    #[error("{message}")]
    Validation { message: String },
}

impl AppError {
    pub fn invalid_target(url: impl Into<String>) -> Self {
        Self::InvalidTarget { url: url.into() }
    }

    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    pub fn expired(code: impl Into<String>) -> Self {
        Self::Expired { code: code.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Returns true for the two uniqueness-conflict variants.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AliasConflict { .. } | Self::CodeConflict { .. }
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::StoreUnavailable {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = AppError::not_found("abc123");
        assert_eq!(err.to_string(), "short link 'abc123' not found");
    }

    #[test]
    fn test_display_expired_is_distinct_from_not_found() {
        let not_found = AppError::not_found("abc123").to_string();
        let expired = AppError::expired("abc123").to_string();
        assert_ne!(not_found, expired);
        assert!(expired.contains("expired"));
    }

    #[test]
    fn test_conflict_predicate() {
        assert!(
            AppError::AliasConflict {
                alias: "promo".into()
            }
            .is_conflict()
        );
        assert!(
            AppError::CodeConflict {
                code: "abc123".into()
            }
            .is_conflict()
        );
        assert!(!AppError::GenerationExhausted.is_conflict());
        assert!(!AppError::not_found("x").is_conflict());
    }

    #[test]
    fn test_target_too_long_names_limit() {
        let err = AppError::TargetTooLong { max: 2048 };
        assert!(err.to_string().contains("2048"));
    }
}
