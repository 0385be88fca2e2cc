use thiserror::Error;

/// Errors from metadata store, cache and distributed lock operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    /// A record with the same public id already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("lock expired: {0}")]
    LockExpired(String),

    /// Release of a key that is not present in the lock table.
    #[error("lock not held: {0}")]
    LockNotHeld(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
