use async_trait::async_trait;
use burnbin_core::ContentHash;
use bytes::Bytes;

use crate::error::BlobError;
use crate::stream::ByteStream;

/// Durable content-addressed blob storage for paste bodies.
///
/// Blobs are immutable once written. A blob is created at most once per
/// distinct content and removed only by the reaper.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether a blob is stored under `hash`.
    async fn exists(&self, hash: &ContentHash) -> Result<bool, BlobError>;

    /// Store `data` under `hash`.
    ///
    /// Idempotent: writing the same content twice leaves the same state.
    async fn put(&self, hash: &ContentHash, data: Bytes) -> Result<(), BlobError>;

    /// Open the blob for reading. Returns `None` if it does not exist.
    async fn get(&self, hash: &ContentHash) -> Result<Option<ByteStream>, BlobError>;

    /// Delete the blob. Returns `true` if it existed; deleting an absent
    /// blob is not an error.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, BlobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_dyn_content_store(_: &dyn ContentStore) {}
}
