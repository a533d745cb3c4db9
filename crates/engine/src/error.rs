//! Engine-level error type.

use deadline_core::CoreError;

/// Error returned by every engine operation.
///
/// Wraps [`CoreError`] for domain failures (validation, not-found,
/// conflicts) and adds the persistence arm. Database errors are not retried
/// here; operations are transactional, so a failed call leaves no partial
/// state behind and the dispatcher decides on retry/backoff.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `deadline-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for operation return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Shorthand for a domain not-found failure.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::Core(CoreError::not_found(entity, key))
    }

    /// Shorthand for a domain validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Validation(message.into()))
    }

    /// Shorthand for a domain conflict failure.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Conflict(message.into()))
    }
}
