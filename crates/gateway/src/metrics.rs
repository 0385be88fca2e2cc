use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::error::NotFoundReason;

/// Atomic counters tracking paste operations.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct PasteMetrics {
    /// Pastes successfully created.
    pub created: AtomicU64,
    /// Creates whose content was already stored.
    pub deduplicated: AtomicU64,
    /// Public id collisions that forced a regenerated id.
    pub id_collisions: AtomicU64,
    /// Reads that returned content.
    pub reads_served: AtomicU64,
    pub not_found_missing: AtomicU64,
    pub not_found_expired: AtomicU64,
    pub not_found_exhausted: AtomicU64,
    pub not_found_content_missing: AtomicU64,
    /// Reads answered by a negative cache entry.
    pub negative_cache_hits: AtomicU64,
    pub metadata_cache_hits: AtomicU64,
    pub metadata_cache_misses: AtomicU64,
    pub metadata_cache_errors: AtomicU64,
    pub content_cache_hits: AtomicU64,
    pub content_cache_misses: AtomicU64,
    pub content_cache_errors: AtomicU64,
    /// Blobs deleted by the reaper.
    pub blobs_reaped: AtomicU64,
    /// Per-blob reaper failures.
    pub reaper_errors: AtomicU64,
}

impl PasteMetrics {
    pub fn increment_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deduplicated(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_id_collisions(&self) {
        self.id_collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reads_served(&self) {
        self.reads_served.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the counter matching `reason`.
    pub fn increment_not_found(&self, reason: NotFoundReason) {
        let counter = match reason {
            NotFoundReason::Missing => &self.not_found_missing,
            NotFoundReason::Expired => &self.not_found_expired,
            NotFoundReason::Exhausted => &self.not_found_exhausted,
            NotFoundReason::NegativelyCached => &self.negative_cache_hits,
            NotFoundReason::ContentMissing => &self.not_found_content_missing,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_metadata_cache_hits(&self) {
        self.metadata_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_metadata_cache_misses(&self) {
        self.metadata_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_metadata_cache_errors(&self) {
        self.metadata_cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_cache_hits(&self) {
        self.content_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_cache_misses(&self) {
        self.content_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_content_cache_errors(&self) {
        self.content_cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_blobs_reaped(&self) {
        self.blobs_reaped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_reaper_errors(&self) {
        self.reaper_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            id_collisions: self.id_collisions.load(Ordering::Relaxed),
            reads_served: self.reads_served.load(Ordering::Relaxed),
            not_found_missing: self.not_found_missing.load(Ordering::Relaxed),
            not_found_expired: self.not_found_expired.load(Ordering::Relaxed),
            not_found_exhausted: self.not_found_exhausted.load(Ordering::Relaxed),
            not_found_content_missing: self.not_found_content_missing.load(Ordering::Relaxed),
            negative_cache_hits: self.negative_cache_hits.load(Ordering::Relaxed),
            metadata_cache_hits: self.metadata_cache_hits.load(Ordering::Relaxed),
            metadata_cache_misses: self.metadata_cache_misses.load(Ordering::Relaxed),
            metadata_cache_errors: self.metadata_cache_errors.load(Ordering::Relaxed),
            content_cache_hits: self.content_cache_hits.load(Ordering::Relaxed),
            content_cache_misses: self.content_cache_misses.load(Ordering::Relaxed),
            content_cache_errors: self.content_cache_errors.load(Ordering::Relaxed),
            blobs_reaped: self.blobs_reaped.load(Ordering::Relaxed),
            reaper_errors: self.reaper_errors.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`PasteMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub created: u64,
    pub deduplicated: u64,
    pub id_collisions: u64,
    pub reads_served: u64,
    pub not_found_missing: u64,
    pub not_found_expired: u64,
    pub not_found_exhausted: u64,
    pub not_found_content_missing: u64,
    pub negative_cache_hits: u64,
    pub metadata_cache_hits: u64,
    pub metadata_cache_misses: u64,
    pub metadata_cache_errors: u64,
    pub content_cache_hits: u64,
    pub content_cache_misses: u64,
    pub content_cache_errors: u64,
    pub blobs_reaped: u64,
    pub reaper_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let metrics = PasteMetrics::default();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn increment_and_snapshot() {
        let metrics = PasteMetrics::default();
        metrics.increment_created();
        metrics.increment_created();
        metrics.increment_deduplicated();
        metrics.increment_blobs_reaped();

        let snap = metrics.snapshot();
        assert_eq!(snap.created, 2);
        assert_eq!(snap.deduplicated, 1);
        assert_eq!(snap.blobs_reaped, 1);
        assert_eq!(snap.reads_served, 0);
    }

    #[test]
    fn not_found_reasons_are_counted_separately() {
        let metrics = PasteMetrics::default();
        metrics.increment_not_found(NotFoundReason::Missing);
        metrics.increment_not_found(NotFoundReason::Expired);
        metrics.increment_not_found(NotFoundReason::Expired);
        metrics.increment_not_found(NotFoundReason::NegativelyCached);

        let snap = metrics.snapshot();
        assert_eq!(snap.not_found_missing, 1);
        assert_eq!(snap.not_found_expired, 2);
        assert_eq!(snap.not_found_exhausted, 0);
        assert_eq!(snap.negative_cache_hits, 1);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let metrics = PasteMetrics::default();
        metrics.increment_reads_served();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["reads_served"], 1);
        assert_eq!(json["created"], 0);
    }
}
