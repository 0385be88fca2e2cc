use async_trait::async_trait;
use burnbin_core::ContentHash;
use bytes::Bytes;
use dashmap::DashMap;

use burnbin_blob::{BlobError, ByteStream, ContentStore, stream_from_bytes};

/// In-memory [`ContentStore`].
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: DashMap<ContentHash, Bytes>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn exists(&self, hash: &ContentHash) -> Result<bool, BlobError> {
        Ok(self.blobs.contains_key(hash))
    }

    async fn put(&self, hash: &ContentHash, data: Bytes) -> Result<(), BlobError> {
        self.blobs.insert(hash.clone(), data);
        Ok(())
    }

    async fn get(&self, hash: &ContentHash) -> Result<Option<ByteStream>, BlobError> {
        Ok(self
            .blobs
            .get(hash)
            .map(|data| stream_from_bytes(data.value().clone())))
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, BlobError> {
        Ok(self.blobs.remove(hash).is_some())
    }
}
