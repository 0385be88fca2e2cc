use std::time::Duration;

use async_trait::async_trait;
use burnbin_core::{ContentHash, PasteRecord};
use bytes::Bytes;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use burnbin_state::cache::{CacheEntry, ContentCache, MetadataCache};
use burnbin_state::error::StateError;

use crate::keys::{content_key, paste_key};

async fn conn(pool: &Pool) -> Result<deadpool_redis::Connection, StateError> {
    pool.get()
        .await
        .map_err(|e| StateError::Connection(e.to_string()))
}

/// Redis-backed [`MetadataCache`].
///
/// Values are the JSON form of [`CacheEntry`]. Positive snapshots are
/// written without expiry; negative markers with `PX ttl`.
pub struct RedisMetadataCache {
    pool: Pool,
    prefix: String,
}

impl RedisMetadataCache {
    pub fn new(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl MetadataCache for RedisMetadataCache {
    async fn get(&self, id: &str) -> Result<CacheEntry<PasteRecord>, StateError> {
        let mut conn = conn(&self.pool).await?;
        let raw: Option<String> = conn
            .get(paste_key(&self.prefix, id))
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(CacheEntry::Absent),
        }
    }

    async fn set(&self, record: &PasteRecord) -> Result<(), StateError> {
        let json = serde_json::to_string(&CacheEntry::Positive(record))?;
        let mut conn = conn(&self.pool).await?;
        let () = conn
            .set(paste_key(&self.prefix, &record.id), json)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn set_negative(&self, id: &str, ttl: Duration) -> Result<(), StateError> {
        let json = serde_json::to_string(&CacheEntry::<PasteRecord>::Negative)?;
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = conn(&self.pool).await?;
        let () = conn
            .pset_ex(paste_key(&self.prefix, id), json, ttl_ms)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }
}

/// Redis-backed [`ContentCache`] storing raw paste bodies.
///
/// Entries carry no expiry; bounding memory is left to the server's
/// `maxmemory-policy`.
pub struct RedisContentCache {
    pool: Pool,
    prefix: String,
}

impl RedisContentCache {
    pub fn new(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl ContentCache for RedisContentCache {
    async fn get(&self, hash: &ContentHash) -> Result<Option<Bytes>, StateError> {
        let mut conn = conn(&self.pool).await?;
        let raw: Option<Vec<u8>> = conn
            .get(content_key(&self.prefix, hash))
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(raw.map(Bytes::from))
    }

    async fn set(&self, hash: &ContentHash, content: Bytes) -> Result<(), StateError> {
        let mut conn = conn(&self.pool).await?;
        let () = conn
            .set(content_key(&self.prefix, hash), content.as_ref())
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(())
    }
}
