use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use burnbin_blob::{ByteStream, ContentStore, collect_stream, stream_from_bytes};
use burnbin_core::{ContentHash, PasteRecord, generate_public_id};
use burnbin_state::{
    CacheEntry, ContentCache, DistributedLock, MetadataCache, MetadataStore, StateError,
};
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::config::OrchestratorConfig;
use crate::error::{GatewayError, NotFoundReason};
use crate::metrics::PasteMetrics;

/// Composes the stores, caches and per-id lock into Create and Read.
///
/// Cache failures are soft: they are logged and the call falls through to
/// the durable store. Store and lock failures abort the operation.
pub struct PasteOrchestrator {
    pub(crate) metadata: Arc<dyn MetadataStore>,
    pub(crate) content: Arc<dyn ContentStore>,
    pub(crate) metadata_cache: Arc<dyn MetadataCache>,
    pub(crate) content_cache: Arc<dyn ContentCache>,
    pub(crate) lock: Arc<dyn DistributedLock>,
    pub(crate) config: OrchestratorConfig,
    pub(crate) metrics: Arc<PasteMetrics>,
}

fn lock_name(id: &str) -> String {
    format!("paste:{id}")
}

impl PasteOrchestrator {
    pub fn metrics(&self) -> &Arc<PasteMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Store `content` and return the new paste's public id.
    ///
    /// `ttl` falls back to the configured default. A `burn_limit` of zero
    /// means unlimited reads until expiry.
    #[instrument(name = "paste.create", skip(self, content), fields(size = content.len()))]
    pub async fn create(
        &self,
        content: Bytes,
        ttl: Option<Duration>,
        burn_limit: u32,
    ) -> Result<String, GatewayError> {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if ttl.is_zero() {
            return Err(GatewayError::InvalidInput("ttl must be positive".into()));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| GatewayError::InvalidInput(format!("ttl out of range: {ttl:?}")))?;

        let now = Utc::now();
        if now.checked_add_signed(ttl).is_none() {
            return Err(GatewayError::InvalidInput(format!(
                "ttl too large: {}s",
                ttl.num_seconds()
            )));
        }

        let hash = ContentHash::of(&content);
        self.store_content(&hash, content).await?;

        for attempt in 1..=self.config.max_id_attempts {
            let id = generate_public_id(&mut rand::thread_rng(), self.config.id_length);
            let record = PasteRecord::new(id, hash.clone(), now, ttl, burn_limit);
            match self
                .timed("metadata_store.create", self.metadata.create(&record))
                .await
            {
                Ok(()) => {
                    self.metrics.increment_created();
                    info!(
                        paste_id = %record.id,
                        content_hash = %hash,
                        expire_at = %record.expire_at,
                        remaining_reads = ?record.remaining_reads,
                        "paste created"
                    );
                    return Ok(record.id);
                }
                Err(GatewayError::State(StateError::Conflict(_))) => {
                    self.metrics.increment_id_collisions();
                    warn!(paste_id = %record.id, attempt, "public id collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(GatewayError::State(StateError::Conflict(format!(
            "no unused public id after {} attempts",
            self.config.max_id_attempts
        ))))
    }

    /// Put the blob unless it is already stored.
    ///
    /// Concurrent uploads of the same bytes may both write; the result is
    /// the same object either way.
    async fn store_content(&self, hash: &ContentHash, content: Bytes) -> Result<(), GatewayError> {
        let exists = match self.timed("content_store.exists", self.content.exists(hash)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(content_hash = %hash, error = %e, "content existence check failed, storing anyway");
                false
            }
        };

        if exists {
            self.metrics.increment_deduplicated();
            debug!(content_hash = %hash, "content already stored");
            return Ok(());
        }

        self.timed("content_store.put", self.content.put(hash, content))
            .await
    }

    /// Resolve a paste to its content, spending one read if it is limited.
    ///
    /// Any not-found outcome other than a negative cache hit leaves a
    /// negative cache entry behind for `negative_ttl`.
    #[instrument(name = "paste.read", skip(self), fields(paste_id = %id))]
    pub async fn read(&self, id: &str) -> Result<ByteStream, GatewayError> {
        let result = self.read_inner(id).await;
        match &result {
            Ok(_) => self.metrics.increment_reads_served(),
            Err(GatewayError::NotFound(reason)) => {
                self.metrics.increment_not_found(*reason);
                debug!(reason = %reason, "paste not found");
                if *reason != NotFoundReason::NegativelyCached {
                    self.remember_missing(id).await;
                }
            }
            Err(_) => {}
        }
        result
    }

    async fn read_inner(&self, id: &str) -> Result<ByteStream, GatewayError> {
        let record = self.resolve_record(id).await?;
        let body = self.resolve_content(&record.content_hash).await?;
        Ok(stream_from_bytes(body))
    }

    /// Run the metadata critical section under the per-id lock.
    ///
    /// The lock is taken before any cache access so that every read of an
    /// id is serialized, cache hits included.
    async fn resolve_record(&self, id: &str) -> Result<PasteRecord, GatewayError> {
        let guard = self
            .lock
            .acquire(&lock_name(id), self.config.lock_timeout)
            .await
            .map_err(|e| GatewayError::LockFailed(e.to_string()))?;

        let outcome = self.locked_lookup(id).await;

        if let Err(e) = guard.release().await {
            warn!(paste_id = %id, error = %e, "failed to release paste lock");
        }
        outcome
    }

    async fn locked_lookup(&self, id: &str) -> Result<PasteRecord, GatewayError> {
        let cached = match self
            .timed("metadata_cache.get", self.metadata_cache.get(id))
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                self.metrics.increment_metadata_cache_errors();
                warn!(paste_id = %id, error = %e, "metadata cache read failed");
                CacheEntry::Absent
            }
        };

        let mut record = match cached {
            CacheEntry::Negative => {
                return Err(GatewayError::NotFound(NotFoundReason::NegativelyCached));
            }
            CacheEntry::Positive(record) => {
                self.metrics.increment_metadata_cache_hits();
                record
            }
            CacheEntry::Absent => {
                self.metrics.increment_metadata_cache_misses();
                self.timed("metadata_store.get", self.metadata.get(id))
                    .await?
                    .ok_or(GatewayError::NotFound(NotFoundReason::Missing))?
            }
        };

        record
            .readability(Utc::now())
            .map_err(|u| GatewayError::NotFound(u.into()))?;

        if record.remaining_reads.is_some() {
            let applied = self
                .timed(
                    "metadata_store.decrement",
                    self.metadata.decrement_remaining(id),
                )
                .await?;
            if !applied {
                // The snapshot was staler than the durable counter.
                return Err(GatewayError::NotFound(NotFoundReason::Exhausted));
            }
            record.apply_decrement();
        }

        if let Err(e) = self
            .timed("metadata_cache.set", self.metadata_cache.set(&record))
            .await
        {
            self.metrics.increment_metadata_cache_errors();
            warn!(paste_id = %id, error = %e, "metadata cache write failed");
        }

        Ok(record)
    }

    /// Load the blob, cache first. Runs outside the lock since blobs are
    /// immutable.
    async fn resolve_content(&self, hash: &ContentHash) -> Result<Bytes, GatewayError> {
        match self
            .timed("content_cache.get", self.content_cache.get(hash))
            .await
        {
            Ok(Some(body)) => {
                self.metrics.increment_content_cache_hits();
                return Ok(body);
            }
            Ok(None) => self.metrics.increment_content_cache_misses(),
            Err(e) => {
                self.metrics.increment_content_cache_errors();
                warn!(content_hash = %hash, error = %e, "content cache read failed");
            }
        }

        let stream = self
            .timed("content_store.get", self.content.get(hash))
            .await?
            .ok_or(GatewayError::NotFound(NotFoundReason::ContentMissing))?;
        let body = self
            .timed("content_store.read", collect_stream(stream))
            .await?;

        if let Err(e) = self
            .timed("content_cache.set", self.content_cache.set(hash, body.clone()))
            .await
        {
            self.metrics.increment_content_cache_errors();
            warn!(content_hash = %hash, error = %e, "content cache write failed");
        }

        Ok(body)
    }

    async fn remember_missing(&self, id: &str) {
        if let Err(e) = self
            .timed(
                "metadata_cache.set_negative",
                self.metadata_cache.set_negative(id, self.config.negative_ttl),
            )
            .await
        {
            self.metrics.increment_metadata_cache_errors();
            warn!(paste_id = %id, error = %e, "negative cache write failed");
        }
    }

    /// Bound an external call by `call_timeout`.
    async fn timed<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, E>>,
        GatewayError: From<E>,
    {
        let after = self.config.call_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(result) => result.map_err(GatewayError::from),
            Err(_) => Err(GatewayError::Timeout { operation, after }),
        }
    }
}
