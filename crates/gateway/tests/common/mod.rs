#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use burnbin_blob::{BlobError, ByteStream, ContentStore};
use burnbin_core::{ContentHash, PasteRecord};
use burnbin_gateway::{OrchestratorBuilder, OrchestratorConfig, PasteOrchestrator};
use burnbin_state::{
    CacheEntry, ContentCache, DistributedLock, LockGuard, MetadataCache, MetadataStore,
    StateError,
};
use burnbin_state_memory::{
    MemoryContentCache, MemoryContentStore, MemoryDistributedLock, MemoryMetadataCache,
    MemoryMetadataStore,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Metadata store that counts calls and can inject failures.
#[derive(Default)]
pub struct CountingMetadataStore {
    pub inner: MemoryMetadataStore,
    pub creates: AtomicUsize,
    pub gets: AtomicUsize,
    pub decrements: AtomicUsize,
    /// Number of upcoming creates to reject with a conflict.
    pub conflicts: AtomicU32,
    pub fail: AtomicBool,
}

impl CountingMetadataStore {
    fn check(&self) -> Result<(), StateError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StateError::Connection("metadata store down".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MetadataStore for CountingMetadataStore {
    async fn create(&self, record: &PasteRecord) -> Result<(), StateError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StateError::Conflict(record.id.clone()));
        }
        self.inner.create(record).await
    }

    async fn get(&self, id: &str) -> Result<Option<PasteRecord>, StateError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.get(id).await
    }

    async fn decrement_remaining(&self, id: &str) -> Result<bool, StateError> {
        self.decrements.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.decrement_remaining(id).await
    }

    async fn list_unreadable_groups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentHash>, StateError> {
        self.check()?;
        self.inner.list_unreadable_groups(now).await
    }
}

/// Content store that counts calls and can inject failures.
#[derive(Default)]
pub struct CountingContentStore {
    pub inner: MemoryContentStore,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    /// Deletes that removed an existing blob.
    pub deletions: AtomicUsize,
    pub fail_exists: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl ContentStore for CountingContentStore {
    async fn exists(&self, hash: &ContentHash) -> Result<bool, BlobError> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(BlobError::Connection("head failed".into()));
        }
        self.inner.exists(hash).await
    }

    async fn put(&self, hash: &ContentHash, data: Bytes) -> Result<(), BlobError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(hash, data).await
    }

    async fn get(&self, hash: &ContentHash) -> Result<Option<ByteStream>, BlobError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(hash).await
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, BlobError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BlobError::Storage("delete refused".into()));
        }
        let existed = self.inner.delete(hash).await?;
        if existed {
            self.deletions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(existed)
    }
}

/// Cache that fails every call.
pub struct BrokenCache;

#[async_trait]
impl MetadataCache for BrokenCache {
    async fn get(&self, _id: &str) -> Result<CacheEntry<PasteRecord>, StateError> {
        Err(StateError::Connection("cache down".into()))
    }

    async fn set(&self, _record: &PasteRecord) -> Result<(), StateError> {
        Err(StateError::Connection("cache down".into()))
    }

    async fn set_negative(&self, _id: &str, _ttl: Duration) -> Result<(), StateError> {
        Err(StateError::Connection("cache down".into()))
    }
}

#[async_trait]
impl ContentCache for BrokenCache {
    async fn get(&self, _hash: &ContentHash) -> Result<Option<Bytes>, StateError> {
        Err(StateError::Connection("cache down".into()))
    }

    async fn set(&self, _hash: &ContentHash, _content: Bytes) -> Result<(), StateError> {
        Err(StateError::Connection("cache down".into()))
    }
}

/// Lock whose acquisition always fails.
pub struct BrokenLock;

#[async_trait]
impl DistributedLock for BrokenLock {
    async fn try_acquire(&self, _name: &str) -> Result<Option<Box<dyn LockGuard>>, StateError> {
        Err(StateError::Connection("lock service down".into()))
    }

    async fn acquire(
        &self,
        _name: &str,
        _timeout: Duration,
    ) -> Result<Box<dyn LockGuard>, StateError> {
        Err(StateError::Connection("lock service down".into()))
    }
}

pub struct Harness {
    pub orchestrator: Arc<PasteOrchestrator>,
    pub metadata: Arc<CountingMetadataStore>,
    pub content: Arc<CountingContentStore>,
    pub metadata_cache: Arc<MemoryMetadataCache>,
    pub lock: Arc<MemoryDistributedLock>,
}

pub fn config() -> OrchestratorConfig {
    OrchestratorConfig {
        negative_ttl: Duration::from_millis(200),
        ..OrchestratorConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: OrchestratorConfig) -> Harness {
    let metadata = Arc::new(CountingMetadataStore::default());
    let content = Arc::new(CountingContentStore::default());
    let metadata_cache = Arc::new(MemoryMetadataCache::new(10_000));
    let lock = Arc::new(MemoryDistributedLock::new());
    let orchestrator = OrchestratorBuilder::new()
        .metadata_store(metadata.clone())
        .content_store(content.clone())
        .metadata_cache(metadata_cache.clone())
        .content_cache(Arc::new(MemoryContentCache::new(1 << 20)))
        .lock(lock.clone())
        .config(config)
        .build()
        .expect("orchestrator should build");
    Harness {
        orchestrator: Arc::new(orchestrator),
        metadata,
        content,
        metadata_cache,
        lock,
    }
}

pub async fn read_bytes(
    orchestrator: &PasteOrchestrator,
    id: &str,
) -> Result<Bytes, burnbin_gateway::GatewayError> {
    let stream = orchestrator.read(id).await?;
    Ok(burnbin_blob::collect_stream(stream).await?)
}

pub const HOUR: Duration = Duration::from_secs(3600);
