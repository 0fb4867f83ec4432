//! Error types for the persistence layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// The database was busy or locked past the configured timeout.
    /// Retryable: no partial write has happened.
    #[error("database busy")]
    Busy,

    /// The connection mutex was poisoned by a panicking writer.
    #[error("database connection poisoned")]
    Poisoned,

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Returns true for failures that are safe to retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::Busy
            }
            _ => Self::Database(err),
        }
    }
}
