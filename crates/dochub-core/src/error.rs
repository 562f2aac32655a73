//! Error type shared by every DocHub crate.
//!
//! Crates convert their own failures into [`AppError`] at the edge (see
//! `dochub_database::error::db_error` for sqlx) so callers only ever match
//! on [`ErrorKind`].

use thiserror::Error;

/// What went wrong, independent of where.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The record does not exist, or belongs to another tenant. The two
    /// cases are deliberately indistinguishable.
    #[error("NOT_FOUND")]
    NotFound,
    /// Malformed input: filename, content type, entity type, tag name.
    #[error("VALIDATION")]
    Validation,
    /// The chain is in a state that forbids the operation.
    #[error("CONFLICT")]
    Conflict,
    /// A concurrent writer won: serialization failure, deadlock, or a chain
    /// backstop index firing. Retrying the whole operation may succeed.
    #[error("RACE_CONDITION")]
    RaceCondition,
    /// Any other database failure.
    #[error("DATABASE")]
    Database,
    /// Byte storage I/O failed.
    #[error("STORAGE")]
    Storage,
    /// Configuration could not be loaded.
    #[error("CONFIGURATION")]
    Configuration,
    /// JSON encoding or decoding failed.
    #[error("SERIALIZATION")]
    Serialization,
    /// A bug.
    #[error("INTERNAL")]
    Internal,
}

/// An [`ErrorKind`] with a message and, optionally, the error that caused it.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Category, for matching.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Error of `kind` without a cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Error of `kind` wrapping `source`.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: Some(Box::new(source)),
            ..Self::new(kind, message)
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn race_condition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RaceCondition, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether repeating the whole operation could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::RaceCondition
    }
}

/// Clones keep kind and message; the source is not cloneable and is dropped.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, format!("Invalid JSON: {err}"), err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O failure: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Invalid configuration: {err}"),
            err,
        )
    }
}
