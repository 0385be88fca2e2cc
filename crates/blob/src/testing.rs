//! Conformance suite for [`ContentStore`] implementations.

use burnbin_core::ContentHash;
use bytes::Bytes;

use crate::error::BlobError;
use crate::store::ContentStore;
use crate::stream::collect_stream;

fn unique_body(label: &str) -> Bytes {
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    Bytes::from(format!("{label}-{nonce:x}"))
}

/// Run the full content store conformance test suite.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_content_store_conformance_tests(
    store: &dyn ContentStore,
) -> Result<(), BlobError> {
    test_missing(store).await?;
    test_put_and_get(store).await?;
    test_put_is_idempotent(store).await?;
    test_delete(store).await?;
    Ok(())
}

async fn test_missing(store: &dyn ContentStore) -> Result<(), BlobError> {
    let hash = ContentHash::of(&unique_body("missing"));
    assert!(!store.exists(&hash).await?, "missing blob should not exist");
    assert!(store.get(&hash).await?.is_none(), "get on missing should be None");
    Ok(())
}

async fn test_put_and_get(store: &dyn ContentStore) -> Result<(), BlobError> {
    let body = unique_body("put-get");
    let hash = ContentHash::of(&body);
    store.put(&hash, body.clone()).await?;
    assert!(store.exists(&hash).await?);
    let stream = store.get(&hash).await?.expect("blob should exist");
    assert_eq!(collect_stream(stream).await?, body);
    Ok(())
}

async fn test_put_is_idempotent(store: &dyn ContentStore) -> Result<(), BlobError> {
    let body = unique_body("idempotent");
    let hash = ContentHash::of(&body);
    store.put(&hash, body.clone()).await?;
    store.put(&hash, body.clone()).await?;
    let stream = store.get(&hash).await?.expect("blob should exist");
    assert_eq!(collect_stream(stream).await?, body);
    Ok(())
}

async fn test_delete(store: &dyn ContentStore) -> Result<(), BlobError> {
    let body = unique_body("delete");
    let hash = ContentHash::of(&body);
    store.put(&hash, body).await?;
    assert!(store.delete(&hash).await?, "delete should report existing blob");
    assert!(!store.exists(&hash).await?);
    assert!(store.get(&hash).await?.is_none());
    assert!(
        !store.delete(&hash).await?,
        "deleting an absent blob should succeed and report false"
    );
    Ok(())
}
