use std::time::Duration;

use async_trait::async_trait;
use burnbin_core::{ContentHash, PasteRecord};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Result of a metadata cache lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "record", rename_all = "snake_case")]
pub enum CacheEntry<T> {
    /// A cached snapshot of the value.
    Positive(T),
    /// The key is known to resolve to nothing.
    Negative,
    /// Nothing is cached for the key.
    Absent,
}

impl<T> CacheEntry<T> {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Read-through cache in front of a [`MetadataStore`](crate::MetadataStore).
///
/// Cache state is advisory. Callers treat every error here as soft.
#[async_trait]
pub trait MetadataCache: Send + Sync {
    async fn get(&self, id: &str) -> Result<CacheEntry<PasteRecord>, StateError>;

    /// Store a positive snapshot without expiry.
    async fn set(&self, record: &PasteRecord) -> Result<(), StateError>;

    /// Record that `id` resolves to nothing, for `ttl`.
    async fn set_negative(&self, id: &str, ttl: Duration) -> Result<(), StateError>;
}

/// Read-through cache for immutable paste bodies, keyed by content hash.
#[async_trait]
pub trait ContentCache: Send + Sync {
    async fn get(&self, hash: &ContentHash) -> Result<Option<Bytes>, StateError>;

    async fn set(&self, hash: &ContentHash, content: Bytes) -> Result<(), StateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_dyn_metadata_cache(_: &dyn MetadataCache) {}
    fn _assert_dyn_content_cache(_: &dyn ContentCache) {}

    #[test]
    fn negative_entry_serializes_without_payload() {
        let entry: CacheEntry<u32> = CacheEntry::Negative;
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"state":"negative"}"#);
        let back: CacheEntry<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CacheEntry::Negative);
    }

    #[test]
    fn positive_entry_carries_record() {
        let entry = CacheEntry::Positive(7u32);
        let json = serde_json::to_string(&entry).unwrap();
        let back: CacheEntry<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CacheEntry::Positive(7));
    }
}
