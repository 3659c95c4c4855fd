//! Common error types for mixhall services

use thiserror::Error;

/// Common result type for mixhall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the review workflow and its stores
#[derive(Error, Debug)]
pub enum Error {
    /// Submission content is malformed or incomplete; caller corrects and resubmits
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Another active submission already targets the same display id
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The target display id was claimed by a published song before approval
    #[error("Identity taken: {0}")]
    IdentityTaken(String),

    /// A create submission references an identity that is already published
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Requested submission or target song not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transition attempted on a submission that is no longer pending
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejection requires a reviewer comment
    #[error("Review comment is required")]
    MissingComment,

    /// Lock acquisition timed out; the operation may be retried
    #[error("Store contention, retry later")]
    Contention,

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if is_busy(&e) {
            return Error::Contention;
        }
        Error::Database(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidPayload(e.to_string())
    }
}

/// SQLITE_BUSY surfaces after busy_timeout expires; callers treat it as retryable
fn is_busy(e: &sqlx::Error) -> bool {
    match e.as_database_error() {
        Some(db) => db.code().as_deref() == Some("5") || db.message().contains("database is locked"),
        None => false,
    }
}

/// Whether a sqlx error is a unique constraint violation.
///
/// The submission store relies on a partial unique index over pending rows;
/// a violation there means another pending submission won the race.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
        .unwrap_or(false)
}
