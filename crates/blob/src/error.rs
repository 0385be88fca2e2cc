use thiserror::Error;

/// Errors that can occur during content store operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The backend could not be reached.
    #[error("blob storage connection error: {0}")]
    Connection(String),

    /// A storage backend error occurred.
    #[error("blob storage error: {0}")]
    Storage(String),

    #[error("blob operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
