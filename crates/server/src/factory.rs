//! Backend selection from configuration.

use std::sync::Arc;
#[cfg(feature = "redis")]
use std::time::Duration;

use burnbin_blob::ContentStore;
use burnbin_gateway::{OrchestratorBuilder, PasteMetrics, PasteOrchestrator, Reaper};
use burnbin_state::{ConnectRetry, ContentCache, DistributedLock, MetadataCache, MetadataStore};
use burnbin_state_memory::{
    MemoryContentCache, MemoryContentStore, MemoryDistributedLock, MemoryMetadataCache,
    MemoryMetadataStore,
};
use tracing::info;

#[cfg(feature = "s3")]
use burnbin_aws::{S3Config, S3ContentStore};
#[cfg(feature = "postgres")]
use burnbin_state_postgres::{PostgresConfig, PostgresMetadataStore};
#[cfg(feature = "redis")]
use burnbin_state_redis::{
    RedisConfig, RedisContentCache, RedisDistributedLock, RedisMetadataCache,
};

use crate::config::{BurnbinConfig, CacheConfig, ContentConfig, LockConfig, MetadataConfig};
use crate::error::ServerError;

/// Create the metadata store named by `[metadata] backend`.
#[allow(clippy::unused_async)]
pub async fn create_metadata_store(
    config: &MetadataConfig,
    retry: ConnectRetry,
) -> Result<Arc<dyn MetadataStore>, ServerError> {
    let store: Arc<dyn MetadataStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryMetadataStore::new()),
        #[cfg(feature = "postgres")]
        "postgres" => {
            let store = PostgresMetadataStore::connect(postgres_config(config)?, retry)
                .await
                .map_err(|e| ServerError::Backend(format!("metadata postgres: {e}")))?;
            Arc::new(store)
        }
        other => {
            let _ = retry;
            return Err(ServerError::Config(format!(
                "unsupported metadata backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, "metadata store initialized");
    Ok(store)
}

#[cfg(feature = "postgres")]
fn postgres_config(config: &MetadataConfig) -> Result<PostgresConfig, ServerError> {
    let url = config.url.clone().ok_or_else(|| {
        ServerError::Config("postgres metadata backend requires [metadata] url".into())
    })?;
    let defaults = PostgresConfig::default();
    Ok(PostgresConfig {
        url,
        pool_size: config.pool_size.unwrap_or(defaults.pool_size),
        schema: config.schema.clone().unwrap_or(defaults.schema),
        table_prefix: config
            .table_prefix
            .clone()
            .unwrap_or(defaults.table_prefix),
        ..defaults
    })
}

/// Create the content store named by `[content] backend`.
#[allow(clippy::unused_async)]
pub async fn create_content_store(
    config: &ContentConfig,
    retry: ConnectRetry,
) -> Result<Arc<dyn ContentStore>, ServerError> {
    let store: Arc<dyn ContentStore> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryContentStore::new()),
        #[cfg(feature = "s3")]
        "s3" => {
            let bucket = config.bucket.as_deref().ok_or_else(|| {
                ServerError::Config("s3 content backend requires [content] bucket".into())
            })?;
            let region = config.region.as_deref().unwrap_or("us-east-1");
            let mut s3_config = S3Config::new(region, bucket);
            if let Some(prefix) = &config.prefix {
                s3_config = s3_config.with_prefix(prefix);
            }
            if let Some(endpoint) = &config.endpoint_url {
                s3_config = s3_config.with_endpoint_url(endpoint);
            }
            let store = S3ContentStore::connect(s3_config, retry)
                .await
                .map_err(|e| ServerError::Backend(format!("content s3: {e}")))?;
            Arc::new(store)
        }
        other => {
            let _ = retry;
            return Err(ServerError::Config(format!(
                "unsupported content backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, "content store initialized");
    Ok(store)
}

/// Create the metadata and content caches named by `[cache] backend`.
#[allow(clippy::unused_async)]
pub async fn create_caches(
    config: &CacheConfig,
    retry: ConnectRetry,
) -> Result<(Arc<dyn MetadataCache>, Arc<dyn ContentCache>), ServerError> {
    let caches: (Arc<dyn MetadataCache>, Arc<dyn ContentCache>) = match config.backend.as_str() {
        "memory" => (
            Arc::new(MemoryMetadataCache::new(config.metadata_capacity)),
            Arc::new(MemoryContentCache::new(config.content_capacity_bytes)),
        ),
        #[cfg(feature = "redis")]
        "redis" => {
            let redis_config =
                redis_config(config.url.as_deref(), config.prefix.as_deref(), "cache")?;
            let pool = burnbin_state_redis::connect(&redis_config, retry)
                .await
                .map_err(|e| ServerError::Backend(format!("cache redis: {e}")))?;
            (
                Arc::new(RedisMetadataCache::new(pool.clone(), &redis_config.prefix)),
                Arc::new(RedisContentCache::new(pool, &redis_config.prefix)),
            )
        }
        other => {
            let _ = retry;
            return Err(ServerError::Config(format!(
                "unsupported cache backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, "caches initialized");
    Ok(caches)
}

/// Create the per-paste lock named by `[lock] backend`.
///
/// The memory lock only serializes reads within one process.
#[allow(clippy::unused_async)]
pub async fn create_lock(
    config: &LockConfig,
    retry: ConnectRetry,
) -> Result<Arc<dyn DistributedLock>, ServerError> {
    let lock: Arc<dyn DistributedLock> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryDistributedLock::new()),
        #[cfg(feature = "redis")]
        "redis" => {
            let redis_config = RedisConfig {
                lease_ttl: Duration::from_millis(config.lease_ttl_ms),
                backoff_min: Duration::from_millis(config.backoff_min_ms),
                backoff_max: Duration::from_millis(config.backoff_max_ms),
                ..redis_config(config.url.as_deref(), config.prefix.as_deref(), "lock")?
            };
            let pool = burnbin_state_redis::connect(&redis_config, retry)
                .await
                .map_err(|e| ServerError::Backend(format!("lock redis: {e}")))?;
            Arc::new(RedisDistributedLock::new(pool, &redis_config))
        }
        other => {
            let _ = retry;
            return Err(ServerError::Config(format!(
                "unsupported lock backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, "lock initialized");
    Ok(lock)
}

#[cfg(feature = "redis")]
fn redis_config(
    url: Option<&str>,
    prefix: Option<&str>,
    section: &str,
) -> Result<RedisConfig, ServerError> {
    let url = url.ok_or_else(|| {
        ServerError::Config(format!("redis {section} backend requires [{section}] url"))
    })?;
    let defaults = RedisConfig::default();
    Ok(RedisConfig {
        url: url.to_owned(),
        prefix: prefix.map_or(defaults.prefix.clone(), str::to_owned),
        ..defaults
    })
}

/// Connect every backend and assemble the orchestrator.
pub async fn build_orchestrator(config: &BurnbinConfig) -> Result<PasteOrchestrator, ServerError> {
    let retry = config.connect.retry_policy();
    let metadata = create_metadata_store(&config.metadata, retry).await?;
    let content = create_content_store(&config.content, retry).await?;
    let (metadata_cache, content_cache) = create_caches(&config.cache, retry).await?;
    let lock = create_lock(&config.lock, retry).await?;

    let orchestrator = OrchestratorBuilder::new()
        .metadata_store(metadata)
        .content_store(content)
        .metadata_cache(metadata_cache)
        .content_cache(content_cache)
        .lock(lock)
        .config(config.paste.orchestrator_config())
        .build()?;
    Ok(orchestrator)
}

/// Connect the two durable stores and build a reaper over them.
pub async fn build_reaper(config: &BurnbinConfig) -> Result<Reaper, ServerError> {
    let retry = config.connect.retry_policy();
    let metadata = create_metadata_store(&config.metadata, retry).await?;
    let content = create_content_store(&config.content, retry).await?;
    Ok(Reaper::new(metadata, content, Arc::new(PasteMetrics::default())))
}
