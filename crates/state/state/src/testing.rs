//! Conformance suites shared by every backend implementation.

use std::time::Duration;

use burnbin_core::{ContentHash, PasteRecord};
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};

use crate::cache::{CacheEntry, ContentCache, MetadataCache};
use crate::error::StateError;
use crate::lock::DistributedLock;
use crate::store::MetadataStore;

// Shared backends (Redis, Postgres) keep data between runs, so every key
// carries a per-run suffix.
fn unique(label: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{label}-{nanos:x}")
}

fn record(id: &str, hash: &ContentHash, ttl_secs: i64, burn: u32) -> PasteRecord {
    PasteRecord::new(
        id,
        hash.clone(),
        Utc::now(),
        ChronoDuration::seconds(ttl_secs),
        burn,
    )
}

/// Run the full metadata store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_metadata_store_conformance_tests(
    store: &dyn MetadataStore,
) -> Result<(), StateError> {
    test_get_missing(store).await?;
    test_create_and_get(store).await?;
    test_create_duplicate_conflicts(store).await?;
    test_decrement(store).await?;
    test_decrement_unlimited(store).await?;
    test_unreadable_groups(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn MetadataStore) -> Result<(), StateError> {
    let val = store.get(&unique("missing")).await?;
    assert!(val.is_none(), "get on missing id should return None");
    Ok(())
}

async fn test_create_and_get(store: &dyn MetadataStore) -> Result<(), StateError> {
    let id = unique("create-get");
    let rec = record(&id, &ContentHash::of(id.as_bytes()), 3600, 3);
    store.create(&rec).await?;
    let got = store.get(&id).await?.expect("record should exist");
    assert_eq!(got.id, rec.id);
    assert_eq!(got.content_hash, rec.content_hash);
    assert_eq!(got.remaining_reads, Some(3));
    // Stores may truncate to microseconds.
    let drift = (got.expire_at - rec.expire_at).num_milliseconds().abs();
    assert!(drift < 1, "expire_at drifted by {drift}ms");
    Ok(())
}

async fn test_create_duplicate_conflicts(store: &dyn MetadataStore) -> Result<(), StateError> {
    let id = unique("dup");
    let hash = ContentHash::of(id.as_bytes());
    store.create(&record(&id, &hash, 3600, 0)).await?;
    let second = store.create(&record(&id, &hash, 60, 1)).await;
    assert!(
        matches!(second, Err(StateError::Conflict(_))),
        "duplicate create should conflict, got {second:?}"
    );
    let got = store.get(&id).await?.expect("original should remain");
    assert_eq!(got.remaining_reads, None, "original record should remain");
    Ok(())
}

async fn test_decrement(store: &dyn MetadataStore) -> Result<(), StateError> {
    let id = unique("decrement");
    store
        .create(&record(&id, &ContentHash::of(id.as_bytes()), 3600, 2))
        .await?;

    assert!(store.decrement_remaining(&id).await?);
    assert_eq!(store.get(&id).await?.and_then(|r| r.remaining_reads), Some(1));

    assert!(store.decrement_remaining(&id).await?);
    assert_eq!(store.get(&id).await?.and_then(|r| r.remaining_reads), Some(0));

    assert!(
        !store.decrement_remaining(&id).await?,
        "decrement at zero should be refused"
    );
    assert_eq!(
        store.get(&id).await?.and_then(|r| r.remaining_reads),
        Some(0),
        "counter must never go negative"
    );

    assert!(!store.decrement_remaining(&unique("nope")).await?);
    Ok(())
}

async fn test_decrement_unlimited(store: &dyn MetadataStore) -> Result<(), StateError> {
    let id = unique("unlimited");
    store
        .create(&record(&id, &ContentHash::of(id.as_bytes()), 3600, 0))
        .await?;
    assert!(!store.decrement_remaining(&id).await?);
    assert_eq!(store.get(&id).await?.and_then(|r| r.remaining_reads), None);
    Ok(())
}

async fn test_unreadable_groups(store: &dyn MetadataStore) -> Result<(), StateError> {
    let shared = ContentHash::of(unique("shared").as_bytes());
    let live = unique("live");
    let expired = unique("expired");
    store.create(&record(&live, &shared, 3600, 0)).await?;
    store.create(&record(&expired, &shared, -10, 0)).await?;

    let exhausted_hash = ContentHash::of(unique("exhausted").as_bytes());
    let burned = unique("burned");
    store.create(&record(&burned, &exhausted_hash, 3600, 1)).await?;

    let groups = store.list_unreadable_groups(Utc::now()).await?;
    assert!(
        !groups.contains(&shared),
        "group with a readable member must not be listed"
    );
    assert!(
        !groups.contains(&exhausted_hash),
        "group with remaining reads must not be listed"
    );

    store.decrement_remaining(&burned).await?;
    let groups = store.list_unreadable_groups(Utc::now()).await?;
    assert!(groups.contains(&exhausted_hash), "exhausted group should be listed");

    let later = Utc::now() + ChronoDuration::hours(2);
    let groups = store.list_unreadable_groups(later).await?;
    assert!(
        groups.contains(&shared),
        "group should be listed once every member expired"
    );
    Ok(())
}

/// Run the full distributed lock conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_lock_conformance_tests(lock: &dyn DistributedLock) -> Result<(), StateError> {
    test_try_acquire_and_release(lock).await?;
    test_try_acquire_contention(lock).await?;
    test_acquire_times_out(lock).await?;
    test_lock_is_held(lock).await?;
    Ok(())
}

async fn test_try_acquire_and_release(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let name = unique("lock-basic");
    let guard = lock.try_acquire(&name).await?;
    assert!(guard.is_some(), "should acquire uncontested lock");
    guard.expect("checked above").release().await?;

    let guard = lock.try_acquire(&name).await?;
    assert!(guard.is_some(), "should re-acquire after release");
    guard.expect("checked above").release().await?;
    Ok(())
}

async fn test_try_acquire_contention(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let name = unique("lock-contention");
    let guard = lock
        .try_acquire(&name)
        .await?
        .expect("should acquire uncontested lock");

    let second = lock.try_acquire(&name).await?;
    assert!(second.is_none(), "second try_acquire should fail while held");

    guard.release().await?;
    Ok(())
}

async fn test_acquire_times_out(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let name = unique("lock-timeout");
    let guard = lock.acquire(&name, Duration::from_secs(1)).await?;

    let waited = lock.acquire(&name, Duration::from_millis(200)).await;
    assert!(waited.is_err(), "acquire should time out while held");

    guard.release().await?;
    let again = lock.acquire(&name, Duration::from_secs(1)).await?;
    again.release().await?;
    Ok(())
}

async fn test_lock_is_held(lock: &dyn DistributedLock) -> Result<(), StateError> {
    let name = unique("lock-held");
    let guard = lock
        .try_acquire(&name)
        .await?
        .expect("should acquire uncontested lock");
    assert_eq!(guard.name(), name);
    assert!(guard.is_held().await?, "guard should report held");
    guard.release().await?;
    Ok(())
}

/// Run the metadata cache conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_metadata_cache_conformance_tests(
    cache: &dyn MetadataCache,
) -> Result<(), StateError> {
    let missing = unique("cache-missing");
    assert!(cache.get(&missing).await?.is_absent());

    let id = unique("cache-positive");
    let rec = record(&id, &ContentHash::of(id.as_bytes()), 3600, 2);
    cache.set(&rec).await?;
    match cache.get(&id).await? {
        CacheEntry::Positive(got) => assert_eq!(got.remaining_reads, Some(2)),
        other => panic!("expected positive entry, got {other:?}"),
    }

    let mut updated = rec.clone();
    updated.apply_decrement();
    cache.set(&updated).await?;
    match cache.get(&id).await? {
        CacheEntry::Positive(got) => assert_eq!(got.remaining_reads, Some(1)),
        other => panic!("expected rewritten positive entry, got {other:?}"),
    }

    let gone = unique("cache-negative");
    cache.set_negative(&gone, Duration::from_secs(3600)).await?;
    assert_eq!(cache.get(&gone).await?, CacheEntry::Negative);
    Ok(())
}

/// Run the content cache conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_content_cache_conformance_tests(
    cache: &dyn ContentCache,
) -> Result<(), StateError> {
    let missing = ContentHash::of(unique("content-missing").as_bytes());
    assert!(cache.get(&missing).await?.is_none());

    let body = Bytes::from(unique("content-body"));
    let hash = ContentHash::of(&body);
    cache.set(&hash, body.clone()).await?;
    assert_eq!(cache.get(&hash).await?, Some(body));
    Ok(())
}
