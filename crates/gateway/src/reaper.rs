use std::sync::Arc;
use std::time::Duration;

use burnbin_blob::ContentStore;
use burnbin_state::MetadataStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::GatewayError;
use crate::metrics::PasteMetrics;

/// Outcome of one reaper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    /// Fully unreadable groups found.
    pub candidates: u64,
    /// Blobs actually removed.
    pub deleted: u64,
    /// Blobs already gone (removed by an earlier pass).
    pub already_absent: u64,
    /// Deletes that failed or timed out; retried by the next pass.
    pub failed: u64,
}

/// Removes blobs whose every referencing paste is unreadable.
///
/// One call to [`run_once`](Self::run_once) is one pass; scheduling is left
/// to an external cron. Paste records are never deleted and stay behind as
/// tombstones, so already-reaped groups are listed again on later passes and
/// count as `already_absent`.
pub struct Reaper {
    metadata: Arc<dyn MetadataStore>,
    content: Arc<dyn ContentStore>,
    metrics: Arc<PasteMetrics>,
    query_timeout: Duration,
    delete_timeout: Duration,
}

impl Reaper {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        content: Arc<dyn ContentStore>,
        metrics: Arc<PasteMetrics>,
    ) -> Self {
        Self {
            metadata,
            content,
            metrics,
            query_timeout: Duration::from_secs(10),
            delete_timeout: Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, query: Duration, delete: Duration) -> Self {
        self.query_timeout = query;
        self.delete_timeout = delete;
        self
    }

    /// Run a single pass evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Only the group query is fatal. Per-blob failures are logged, counted
    /// and left for the next pass.
    #[instrument(name = "reaper.run_once", skip(self))]
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<ReapReport, GatewayError> {
        let groups = tokio::time::timeout(
            self.query_timeout,
            self.metadata.list_unreadable_groups(now),
        )
        .await
        .map_err(|_| GatewayError::Timeout {
            operation: "metadata_store.list_unreadable_groups",
            after: self.query_timeout,
        })??;

        let mut report = ReapReport {
            candidates: groups.len() as u64,
            ..ReapReport::default()
        };

        for hash in groups {
            match tokio::time::timeout(self.delete_timeout, self.content.delete(&hash)).await {
                Ok(Ok(true)) => {
                    report.deleted += 1;
                    self.metrics.increment_blobs_reaped();
                    debug!(content_hash = %hash, "blob reaped");
                }
                Ok(Ok(false)) => report.already_absent += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    self.metrics.increment_reaper_errors();
                    warn!(content_hash = %hash, error = %e, "failed to delete blob");
                }
                Err(_) => {
                    report.failed += 1;
                    self.metrics.increment_reaper_errors();
                    warn!(content_hash = %hash, timeout = ?self.delete_timeout, "blob delete timed out");
                }
            }
        }

        info!(
            candidates = report.candidates,
            deleted = report.deleted,
            already_absent = report.already_absent,
            failed = report.failed,
            "reaper pass complete"
        );
        Ok(report)
    }
}
