use std::fmt;
use std::time::Duration;

use burnbin_core::Unreadable;
use thiserror::Error;

/// Why a paste lookup resolved to nothing.
///
/// Externally every reason is the same "not found"; the distinction is
/// kept for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotFoundReason {
    /// No record with this id exists.
    Missing,
    Expired,
    /// The burn-after-read counter reached zero.
    Exhausted,
    /// A negative cache entry answered without consulting the store.
    NegativelyCached,
    /// The record is readable but its blob is gone.
    ContentMissing,
}

impl NotFoundReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
            Self::NegativelyCached => "negatively_cached",
            Self::ContentMissing => "content_missing",
        }
    }
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Unreadable> for NotFoundReason {
    fn from(u: Unreadable) -> Self {
        match u {
            Unreadable::Expired => Self::Expired,
            Unreadable::Exhausted => Self::Exhausted,
        }
    }
}

/// Errors that can occur during paste operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The paste cannot be served.
    #[error("paste not found ({0})")]
    NotFound(NotFoundReason),

    /// An error occurred in the metadata store or a cache.
    #[error("state error: {0}")]
    State(#[from] burnbin_state::StateError),

    /// An error occurred in the content store.
    #[error("blob error: {0}")]
    Blob(#[from] burnbin_blob::BlobError),

    /// Failed to acquire the per-paste lock.
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),

    /// An external call did not finish within its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The caller supplied an unusable argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The orchestrator was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    /// Whether this error belongs to the externally visible not-found class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
