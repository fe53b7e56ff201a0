//! Error types for the repository crate.
//!
//! Every repository operation classifies its failure into one of four
//! classes, each with a stable external status. The HTTP surface maps
//! them directly; nothing else should need to inspect messages.

use thiserror::Error;

/// Failures from the user and email repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matches the request.
    #[error("not found: {0}")]
    NotFound(String),

    /// The write would break a uniqueness guarantee.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request itself is malformed.
    #[error("bad input: {0}")]
    BadInput(String),

    /// The storage backend failed.
    #[error("internal: {0}")]
    Internal(String),
}

/// Specialized `Result` type for repository operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Returns `true` if no record matched the request.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if the write would break a uniqueness guarantee.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Returns `true` if the request itself was malformed.
    #[must_use]
    pub const fn is_bad_input(&self) -> bool {
        matches!(self, Self::BadInput(_))
    }

    /// The HTTP status this error surfaces as.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::BadInput(_) => 400,
            Self::Internal(_) => 500,
        }
    }
}

/// Classify a database failure.
///
/// Unique violations become conflicts and a missing row becomes not
/// found; anything else is internal.
impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::NotFound(error.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(error.to_string())
            }
            _ => Self::Internal(error.to_string()),
        }
    }
}
