use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Metadata for a single paste.
///
/// Owned by the metadata store. The only mutation after creation is the
/// atomic decrement of `remaining_reads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRecord {
    pub id: String,
    pub content_hash: ContentHash,
    pub expire_at: DateTime<Utc>,
    /// `None` means unlimited reads until `expire_at`.
    pub remaining_reads: Option<u32>,
}

/// Why a record cannot be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unreadable {
    #[error("paste expired")]
    Expired,
    #[error("paste read limit exhausted")]
    Exhausted,
}

impl PasteRecord {
    /// Build a record expiring `ttl` after `now`.
    ///
    /// A `burn_limit` of zero means unlimited reads. An expiry past the
    /// representable range is clamped to [`DateTime::<Utc>::MAX_UTC`].
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        content_hash: ContentHash,
        now: DateTime<Utc>,
        ttl: Duration,
        burn_limit: u32,
    ) -> Self {
        Self {
            id: id.into(),
            content_hash,
            expire_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            remaining_reads: (burn_limit > 0).then_some(burn_limit),
        }
    }

    /// Check whether the record may be served at `now`.
    ///
    /// Expiry takes precedence over the read counter.
    pub fn readability(&self, now: DateTime<Utc>) -> Result<(), Unreadable> {
        if now >= self.expire_at {
            return Err(Unreadable::Expired);
        }
        if self.remaining_reads == Some(0) {
            return Err(Unreadable::Exhausted);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_readable(&self, now: DateTime<Utc>) -> bool {
        self.readability(now).is_ok()
    }

    /// Reflect a successful store-side decrement on this copy.
    pub fn apply_decrement(&mut self) {
        if let Some(n) = self.remaining_reads.as_mut() {
            *n = n.saturating_sub(1);
        }
    }
}
