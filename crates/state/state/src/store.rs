use async_trait::async_trait;
use burnbin_core::{ContentHash, PasteRecord};
use chrono::{DateTime, Utc};

use crate::error::StateError;

/// Durable record of paste metadata, keyed by public id.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new record.
    ///
    /// Returns [`StateError::Conflict`] if a record with the same id exists.
    async fn create(&self, record: &PasteRecord) -> Result<(), StateError>;

    /// Fetch a record by public id. `None` if it was never created.
    async fn get(&self, id: &str) -> Result<Option<PasteRecord>, StateError>;

    /// Atomically decrement `remaining_reads` for `id`.
    ///
    /// Returns `false` when nothing was decremented: the record is missing,
    /// has unlimited reads, or is already at zero.
    async fn decrement_remaining(&self, id: &str) -> Result<bool, StateError>;

    /// Content hashes whose every referencing record is unreadable at `now`.
    async fn list_unreadable_groups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentHash>, StateError>;
}
