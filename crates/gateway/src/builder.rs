use std::sync::Arc;

use burnbin_blob::ContentStore;
use burnbin_state::{ContentCache, DistributedLock, MetadataCache, MetadataStore};

use crate::config::OrchestratorConfig;
use crate::error::GatewayError;
use crate::metrics::PasteMetrics;
use crate::orchestrator::PasteOrchestrator;

/// Fluent builder for constructing a [`PasteOrchestrator`].
///
/// Every backend is required. Configuration defaults to
/// [`OrchestratorConfig::default`] and is validated on [`build`](Self::build).
#[derive(Default)]
pub struct OrchestratorBuilder {
    metadata: Option<Arc<dyn MetadataStore>>,
    content: Option<Arc<dyn ContentStore>>,
    metadata_cache: Option<Arc<dyn MetadataCache>>,
    content_cache: Option<Arc<dyn ContentCache>>,
    lock: Option<Arc<dyn DistributedLock>>,
    config: OrchestratorConfig,
    metrics: Option<Arc<PasteMetrics>>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(store);
        self
    }

    #[must_use]
    pub fn content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content = Some(store);
        self
    }

    #[must_use]
    pub fn metadata_cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.metadata_cache = Some(cache);
        self
    }

    #[must_use]
    pub fn content_cache(mut self, cache: Arc<dyn ContentCache>) -> Self {
        self.content_cache = Some(cache);
        self
    }

    /// Set the per-paste lock implementation.
    #[must_use]
    pub fn lock(mut self, lock: Arc<dyn DistributedLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    #[must_use]
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing metrics instance (e.g. with the reaper).
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<PasteMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if a backend is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<PasteOrchestrator, GatewayError> {
        self.config.validate()?;

        let metadata = self
            .metadata
            .ok_or_else(|| GatewayError::Configuration("metadata store is required".into()))?;
        let content = self
            .content
            .ok_or_else(|| GatewayError::Configuration("content store is required".into()))?;
        let metadata_cache = self
            .metadata_cache
            .ok_or_else(|| GatewayError::Configuration("metadata cache is required".into()))?;
        let content_cache = self
            .content_cache
            .ok_or_else(|| GatewayError::Configuration("content cache is required".into()))?;
        let lock = self
            .lock
            .ok_or_else(|| GatewayError::Configuration("distributed lock is required".into()))?;

        Ok(PasteOrchestrator {
            metadata,
            content,
            metadata_cache,
            content_cache,
            lock,
            config: self.config,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}
