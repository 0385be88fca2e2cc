mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use burnbin_blob::ContentStore;
use burnbin_core::{ContentHash, PasteRecord};
use burnbin_gateway::{GatewayError, NotFoundReason, OrchestratorBuilder};
use burnbin_state::{CacheEntry, MetadataCache, MetadataStore, StateError};
use burnbin_state_memory::{MemoryContentStore, MemoryDistributedLock};
use bytes::Bytes;
use chrono::Utc;

use common::{
    BrokenCache, BrokenLock, CountingContentStore, CountingMetadataStore, HOUR, harness,
    read_bytes,
};

fn not_found(result: Result<Bytes, GatewayError>) -> NotFoundReason {
    match result {
        Err(GatewayError::NotFound(reason)) => reason,
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn unlimited_paste_reads_repeatedly() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"hello"), Some(HOUR), 0)
        .await
        .unwrap();

    assert_eq!(id.len(), 10);
    assert_eq!(read_bytes(&h.orchestrator, &id).await.unwrap(), "hello");
    assert_eq!(read_bytes(&h.orchestrator, &id).await.unwrap(), "hello");
    assert_eq!(h.metadata.decrements.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn identical_content_is_stored_once() {
    let h = harness();
    let a = h
        .orchestrator
        .create(Bytes::from_static(b"same"), Some(HOUR), 0)
        .await
        .unwrap();
    let b = h
        .orchestrator
        .create(Bytes::from_static(b"same"), Some(HOUR), 0)
        .await
        .unwrap();

    assert_ne!(a, b);
    assert_eq!(h.content.inner.len(), 1);
    assert_eq!(h.content.puts.load(Ordering::SeqCst), 1);
    assert_eq!(h.orchestrator.metrics().snapshot().deduplicated, 1);
}

#[tokio::test]
async fn burn_after_one_read() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"secret"), Some(HOUR), 1)
        .await
        .unwrap();

    assert_eq!(read_bytes(&h.orchestrator, &id).await.unwrap(), "secret");
    // The cached snapshot says exhausted, so the store is not asked again.
    assert_eq!(
        not_found(read_bytes(&h.orchestrator, &id).await),
        NotFoundReason::Exhausted
    );
    // The third read is answered by the negative entry.
    assert_eq!(
        not_found(read_bytes(&h.orchestrator, &id).await),
        NotFoundReason::NegativelyCached
    );
    assert_eq!(h.metadata.decrements.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn burn_limit_counts_down() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"thrice"), Some(HOUR), 3)
        .await
        .unwrap();

    for _ in 0..3 {
        assert_eq!(read_bytes(&h.orchestrator, &id).await.unwrap(), "thrice");
    }
    assert!(read_bytes(&h.orchestrator, &id).await.is_err());
    let stored = h.metadata.inner.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.remaining_reads, Some(0));
}

#[tokio::test]
async fn expiry_wins_over_remaining_reads() {
    let h = harness();
    let body = Bytes::from_static(b"old");
    let hash = ContentHash::of(&body);
    h.content.inner.put(&hash, body).await.unwrap();
    let record = PasteRecord::new(
        "stale",
        hash,
        Utc::now() - chrono::Duration::hours(2),
        chrono::Duration::hours(1),
        5,
    );
    h.metadata.inner.create(&record).await.unwrap();

    assert_eq!(
        not_found(read_bytes(&h.orchestrator, "stale").await),
        NotFoundReason::Expired
    );
    assert_eq!(h.metadata.decrements.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn negative_cache_spares_the_store_until_ttl() {
    let h = harness();

    assert_eq!(
        not_found(read_bytes(&h.orchestrator, "nothing").await),
        NotFoundReason::Missing
    );
    assert_eq!(h.metadata.gets.load(Ordering::SeqCst), 1);

    assert_eq!(
        not_found(read_bytes(&h.orchestrator, "nothing").await),
        NotFoundReason::NegativelyCached
    );
    assert_eq!(h.metadata.gets.load(Ordering::SeqCst), 1);

    // Negative TTL in the harness is 200ms.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        not_found(read_bytes(&h.orchestrator, "nothing").await),
        NotFoundReason::Missing
    );
    assert_eq!(h.metadata.gets.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_spend_a_single_read_once() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"once"), Some(HOUR), 1)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let orchestrator = Arc::clone(&h.orchestrator);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            read_bytes(&orchestrator, &id).await
        }));
    }

    let mut served = 0;
    let mut missing = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(body) => {
                assert_eq!(body, "once");
                served += 1;
            }
            Err(e) if e.is_not_found() => missing += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(served, 1);
    assert_eq!(missing, 15);
    assert_eq!(h.metadata.decrements.load(Ordering::SeqCst), 1);
    assert_eq!(h.lock.active_keys(), 0);
}

#[tokio::test]
async fn positive_cache_hit_skips_store() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"cached"), Some(HOUR), 0)
        .await
        .unwrap();

    read_bytes(&h.orchestrator, &id).await.unwrap();
    read_bytes(&h.orchestrator, &id).await.unwrap();
    read_bytes(&h.orchestrator, &id).await.unwrap();

    assert_eq!(h.metadata.gets.load(Ordering::SeqCst), 1);
    assert_eq!(h.content.gets.load(Ordering::SeqCst), 1);
    let snap = h.orchestrator.metrics().snapshot();
    assert_eq!(snap.metadata_cache_hits, 2);
    assert_eq!(snap.content_cache_hits, 2);
    assert_eq!(snap.reads_served, 3);
}

#[tokio::test]
async fn stale_snapshot_defers_to_store_counter() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"raced"), Some(HOUR), 1)
        .await
        .unwrap();
    let record = h.metadata.inner.get(&id).await.unwrap().unwrap();
    // Cache still believes one read remains, the store has none.
    h.metadata_cache.set(&record).await.unwrap();
    assert!(h.metadata.inner.decrement_remaining(&id).await.unwrap());

    assert_eq!(
        not_found(read_bytes(&h.orchestrator, &id).await),
        NotFoundReason::Exhausted
    );
}

#[tokio::test]
async fn lock_released_on_every_path() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"x"), Some(HOUR), 1)
        .await
        .unwrap();

    read_bytes(&h.orchestrator, &id).await.unwrap();
    assert_eq!(h.lock.active_keys(), 0);
    let _ = read_bytes(&h.orchestrator, &id).await;
    assert_eq!(h.lock.active_keys(), 0);
    let _ = read_bytes(&h.orchestrator, "unknown").await;
    assert_eq!(h.lock.active_keys(), 0);

    h.metadata.fail.store(true, Ordering::SeqCst);
    let _ = read_bytes(&h.orchestrator, "other").await;
    assert_eq!(h.lock.active_keys(), 0);
}

#[tokio::test]
async fn missing_blob_is_not_found() {
    let h = harness();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"vanishing"), Some(HOUR), 0)
        .await
        .unwrap();
    h.content
        .inner
        .delete(&ContentHash::of(b"vanishing"))
        .await
        .unwrap();

    assert_eq!(
        not_found(read_bytes(&h.orchestrator, &id).await),
        NotFoundReason::ContentMissing
    );
    assert_eq!(
        h.metadata_cache.get(&id).await.unwrap(),
        CacheEntry::Negative
    );
}

#[tokio::test]
async fn broken_caches_are_tolerated() {
    let metadata = Arc::new(CountingMetadataStore::default());
    let orchestrator = OrchestratorBuilder::new()
        .metadata_store(metadata.clone())
        .content_store(Arc::new(MemoryContentStore::new()))
        .metadata_cache(Arc::new(BrokenCache))
        .content_cache(Arc::new(BrokenCache))
        .lock(Arc::new(MemoryDistributedLock::new()))
        .build()
        .unwrap();

    let id = orchestrator
        .create(Bytes::from_static(b"resilient"), Some(HOUR), 2)
        .await
        .unwrap();
    assert_eq!(read_bytes(&orchestrator, &id).await.unwrap(), "resilient");
    assert_eq!(read_bytes(&orchestrator, &id).await.unwrap(), "resilient");
    assert_eq!(
        not_found(read_bytes(&orchestrator, &id).await),
        NotFoundReason::Exhausted
    );

    // Every lookup fell through to the store.
    assert_eq!(metadata.gets.load(Ordering::SeqCst), 3);
    assert!(orchestrator.metrics().snapshot().metadata_cache_errors > 0);
    assert!(orchestrator.metrics().snapshot().content_cache_errors > 0);
}

#[tokio::test]
async fn lock_failure_aborts_read() {
    let metadata = Arc::new(CountingMetadataStore::default());
    let orchestrator = OrchestratorBuilder::new()
        .metadata_store(metadata.clone())
        .content_store(Arc::new(MemoryContentStore::new()))
        .metadata_cache(Arc::new(BrokenCache))
        .content_cache(Arc::new(BrokenCache))
        .lock(Arc::new(BrokenLock))
        .build()
        .unwrap();

    let err = read_bytes(&orchestrator, "abc").await.unwrap_err();
    assert!(matches!(err, GatewayError::LockFailed(_)));
    assert!(!err.is_not_found());
    assert_eq!(metadata.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn metadata_store_failure_is_fatal() {
    let h = harness();
    h.metadata.fail.store(true, Ordering::SeqCst);

    let err = h
        .orchestrator
        .create(Bytes::from_static(b"doomed"), Some(HOUR), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::State(StateError::Connection(_))));

    let err = read_bytes(&h.orchestrator, "anything").await.unwrap_err();
    assert!(matches!(err, GatewayError::State(_)));
    // Infrastructure errors are not cached as not-found.
    assert!(
        h.metadata_cache
            .get("anything")
            .await
            .unwrap()
            .is_absent()
    );
}

#[tokio::test]
async fn exists_failure_still_stores_content() {
    let h = harness();
    h.content.fail_exists.store(true, Ordering::SeqCst);

    let id = h
        .orchestrator
        .create(Bytes::from_static(b"blind"), Some(HOUR), 0)
        .await
        .unwrap();
    assert_eq!(h.content.puts.load(Ordering::SeqCst), 1);
    assert_eq!(read_bytes(&h.orchestrator, &id).await.unwrap(), "blind");
}

#[tokio::test]
async fn id_collision_is_retried() {
    let h = harness();
    h.metadata.conflicts.store(2, Ordering::SeqCst);

    let id = h
        .orchestrator
        .create(Bytes::from_static(b"lucky"), Some(HOUR), 0)
        .await
        .unwrap();
    assert_eq!(h.metadata.creates.load(Ordering::SeqCst), 3);
    assert_eq!(h.orchestrator.metrics().snapshot().id_collisions, 2);
    assert_eq!(read_bytes(&h.orchestrator, &id).await.unwrap(), "lucky");
}

#[tokio::test]
async fn id_collisions_give_up_after_max_attempts() {
    let h = harness();
    h.metadata.conflicts.store(10, Ordering::SeqCst);

    let err = h
        .orchestrator
        .create(Bytes::from_static(b"unlucky"), Some(HOUR), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::State(StateError::Conflict(_))));
    assert_eq!(h.metadata.creates.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn default_ttl_applies_when_omitted() {
    let h = harness();
    let before = Utc::now();
    let id = h
        .orchestrator
        .create(Bytes::from_static(b"default"), None, 0)
        .await
        .unwrap();
    let record = h.metadata.inner.get(&id).await.unwrap().unwrap();
    let lifetime = record.expire_at - before;
    assert!(lifetime >= chrono::Duration::hours(24) - chrono::Duration::seconds(1));
    assert!(lifetime <= chrono::Duration::hours(24) + chrono::Duration::seconds(1));
}

#[tokio::test]
async fn zero_ttl_is_rejected() {
    let h = harness();
    let err = h
        .orchestrator
        .create(Bytes::from_static(b"zero"), Some(Duration::ZERO), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(_)));
    assert_eq!(h.content.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unrepresentable_ttl_is_rejected() {
    let h = harness();
    let err = h
        .orchestrator
        .create(
            Bytes::from_static(b"x"),
            Some(Duration::from_secs(10_000_000_000_000)),
            0,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(_)));
    assert_eq!(h.content.puts.load(Ordering::SeqCst), 0);
    assert_eq!(h.metadata.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn slow_store_times_out() {
    struct Stalled;

    #[async_trait::async_trait]
    impl MetadataStore for Stalled {
        async fn create(&self, _record: &PasteRecord) -> Result<(), StateError> {
            std::future::pending().await
        }
        async fn get(&self, _id: &str) -> Result<Option<PasteRecord>, StateError> {
            std::future::pending().await
        }
        async fn decrement_remaining(&self, _id: &str) -> Result<bool, StateError> {
            std::future::pending().await
        }
        async fn list_unreadable_groups(
            &self,
            _now: chrono::DateTime<Utc>,
        ) -> Result<Vec<ContentHash>, StateError> {
            std::future::pending().await
        }
    }

    let orchestrator = OrchestratorBuilder::new()
        .metadata_store(Arc::new(Stalled))
        .content_store(Arc::new(CountingContentStore::default()))
        .metadata_cache(Arc::new(BrokenCache))
        .content_cache(Arc::new(BrokenCache))
        .lock(Arc::new(MemoryDistributedLock::new()))
        .config(burnbin_gateway::OrchestratorConfig {
            call_timeout: Duration::from_millis(50),
            ..common::config()
        })
        .build()
        .unwrap();

    let err = read_bytes(&orchestrator, "slow").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Timeout { operation: "metadata_store.get", .. }
    ));
}
