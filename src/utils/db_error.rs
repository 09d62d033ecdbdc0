//! Translation of record-store constraint violations into typed conflicts.

use crate::error::AppError;

/// Constraint name enforcing short code uniqueness.
pub const SHORT_CODE_CONSTRAINT: &str = "short_links_short_code_key";

/// Constraint name enforcing custom alias uniqueness.
pub const CUSTOM_ALIAS_CONSTRAINT: &str = "short_links_custom_alias_key";

/// Maps a unique-violation constraint name to the typed conflict it
/// represents, identifying which field conflicted.
///
/// Returns `None` for constraints this crate does not recognize.
pub fn conflict_for_constraint(
    constraint: Option<&str>,
    code: &str,
    alias: Option<&str>,
) -> Option<AppError> {
    match constraint {
        Some(SHORT_CODE_CONSTRAINT) => Some(AppError::CodeConflict {
            code: code.to_string(),
        }),
        Some(CUSTOM_ALIAS_CONSTRAINT) => Some(AppError::AliasConflict {
            alias: alias.unwrap_or(code).to_string(),
        }),
        _ => None,
    }
}

/// Translates a `sqlx` error raised during an insert into the typed
/// conflict for the violated constraint, or [`AppError::StoreUnavailable`]
/// for everything else.
pub fn map_insert_error(e: sqlx::Error, code: &str, alias: Option<&str>) -> AppError {
    if let Some(db_err) = e.as_database_error()
        && db_err.is_unique_violation()
        && let Some(conflict) = conflict_for_constraint(db_err.constraint(), code, alias)
    {
        return conflict;
    }

    AppError::from(e)
}
