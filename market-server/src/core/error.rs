//! Unified error handling
//!
//! One taxonomy for the whole engine:
//!
//! | Variant | Propagation |
//! |---------|-------------|
//! | `Validation` | synchronous, before any persistence |
//! | `InvariantViolation` | synchronous, no partial write |
//! | `NotAuthorized` | ownership filter matched zero rows |
//! | `NotFound` | target id absent |
//! | `StorageUnavailable` | configured backend unreachable; never substituted |
//! | `Database` | backend reachable but the statement failed |
//!
//! Mail transport failures are a separate [`crate::notify::TransportError`]:
//! they are logged by the dispatcher and never reach a caller.

use thiserror::Error;

/// Application error enum
#[derive(Debug, Error)]
pub enum MarketError {
    /// Required field missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A domain invariant would be broken (quantity increase,
    /// delivery date in the past).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Ownership filter did not match the target row.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Target id absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The configured backend could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The backend rejected or failed the statement.
    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for engine operations
pub type MarketResult<T> = Result<T, MarketError>;

impl From<sqlx::Error> for MarketError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => MarketError::StorageUnavailable(err.to_string()),
            _ => MarketError::Database(err.to_string()),
        }
    }
}
