use std::time::{Duration, Instant};

use async_trait::async_trait;
use burnbin_core::{ContentHash, PasteRecord};
use bytes::Bytes;
use moka::Expiry;
use moka::future::Cache;

use burnbin_state::cache::{CacheEntry, ContentCache, MetadataCache};
use burnbin_state::error::StateError;

#[derive(Debug, Clone)]
enum Slot {
    Positive(PasteRecord),
    Negative { ttl: Duration },
}

/// Positive snapshots never expire on their own; negative markers carry
/// their own TTL. Rewrites reset the clock.
struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Slot,
        _created_at: Instant,
    ) -> Option<Duration> {
        match value {
            Slot::Positive(_) => None,
            Slot::Negative { ttl } => Some(*ttl),
        }
    }

    fn expire_after_update(
        &self,
        key: &String,
        value: &Slot,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.expire_after_create(key, value, updated_at)
    }
}

/// In-process [`MetadataCache`] backed by [`moka`].
///
/// Bounded by entry count; eviction is moka's.
#[derive(Clone)]
pub struct MemoryMetadataCache {
    cache: Cache<String, Slot>,
}

impl MemoryMetadataCache {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(SlotExpiry)
            .build();
        Self { cache }
    }
}

impl std::fmt::Debug for MemoryMetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMetadataCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl MetadataCache for MemoryMetadataCache {
    async fn get(&self, id: &str) -> Result<CacheEntry<PasteRecord>, StateError> {
        Ok(match self.cache.get(id).await {
            Some(Slot::Positive(record)) => CacheEntry::Positive(record),
            Some(Slot::Negative { .. }) => CacheEntry::Negative,
            None => CacheEntry::Absent,
        })
    }

    async fn set(&self, record: &PasteRecord) -> Result<(), StateError> {
        self.cache
            .insert(record.id.clone(), Slot::Positive(record.clone()))
            .await;
        Ok(())
    }

    async fn set_negative(&self, id: &str, ttl: Duration) -> Result<(), StateError> {
        self.cache.insert(id.to_owned(), Slot::Negative { ttl }).await;
        Ok(())
    }
}

/// In-process [`ContentCache`] bounded by total body size.
#[derive(Clone)]
pub struct MemoryContentCache {
    cache: Cache<ContentHash, Bytes>,
}

impl MemoryContentCache {
    pub fn new(capacity_bytes: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity_bytes)
            .weigher(|_hash: &ContentHash, body: &Bytes| -> u32 {
                u32::try_from(body.len()).unwrap_or(u32::MAX)
            })
            .build();
        Self { cache }
    }
}

impl std::fmt::Debug for MemoryContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContentCache")
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}

#[async_trait]
impl ContentCache for MemoryContentCache {
    async fn get(&self, hash: &ContentHash) -> Result<Option<Bytes>, StateError> {
        Ok(self.cache.get(hash).await)
    }

    async fn set(&self, hash: &ContentHash, content: Bytes) -> Result<(), StateError> {
        self.cache.insert(hash.clone(), content).await;
        Ok(())
    }
}
