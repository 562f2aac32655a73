//! Mapping from sqlx errors into [`AppError`].

use dochub_core::error::{AppError, ErrorKind};

/// Unique index guarding one `version_number` per chain.
pub const CHAIN_NUMBER_KEY: &str = "version_record_chain_number_key";
/// Partial unique index guarding one current record per chain.
pub const CHAIN_CURRENT_KEY: &str = "version_record_chain_current_key";

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

/// Classify a sqlx error and wrap it with context.
///
/// Serialization failures, deadlocks, and violations of the chain
/// invariant indexes become [`ErrorKind::RaceCondition`]; every other
/// failure, constraint violations included, is [`ErrorKind::Database`].
pub fn db_error(err: sqlx::Error, context: &str) -> AppError {
    let kind = classify(&err);
    let message = match kind {
        ErrorKind::RaceCondition => format!("{context}: concurrent modification of the chain"),
        _ => context.to_string(),
    };
    AppError::with_source(kind, message, err)
}

fn classify(err: &sqlx::Error) -> ErrorKind {
    let sqlx::Error::Database(db_err) = err else {
        return ErrorKind::Database;
    };
    let code = db_err.code();
    classify_code(code.as_deref(), db_err.constraint())
}

fn classify_code(code: Option<&str>, constraint: Option<&str>) -> ErrorKind {
    match code {
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => ErrorKind::RaceCondition,
        Some(UNIQUE_VIOLATION)
            if matches!(constraint, Some(CHAIN_NUMBER_KEY) | Some(CHAIN_CURRENT_KEY)) =>
        {
            ErrorKind::RaceCondition
        }
        _ => ErrorKind::Database,
    }
}
