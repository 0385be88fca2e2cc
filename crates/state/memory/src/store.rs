use std::collections::HashMap;

use async_trait::async_trait;
use burnbin_core::{ContentHash, PasteRecord};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use burnbin_state::error::StateError;
use burnbin_state::store::MetadataStore;

/// In-memory [`MetadataStore`] backed by a [`DashMap`].
///
/// Records are never evicted; the reaper only removes blobs.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    records: DashMap<String, PasteRecord>,
}

impl MemoryMetadataStore {
    /// Create a new, empty in-memory metadata store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn create(&self, record: &PasteRecord) -> Result<(), StateError> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StateError::Conflict(record.id.clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<PasteRecord>, StateError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn decrement_remaining(&self, id: &str) -> Result<bool, StateError> {
        let Some(mut record) = self.records.get_mut(id) else {
            return Ok(false);
        };
        match record.remaining_reads.as_mut() {
            Some(n) if *n > 0 => {
                *n -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_unreadable_groups(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentHash>, StateError> {
        let mut groups: HashMap<ContentHash, bool> = HashMap::new();
        for record in &self.records {
            let unreadable = !record.is_readable(now);
            groups
                .entry(record.content_hash.clone())
                .and_modify(|all| *all &= unreadable)
                .or_insert(unreadable);
        }
        let mut hashes: Vec<ContentHash> = groups
            .into_iter()
            .filter_map(|(hash, all)| all.then_some(hash))
            .collect();
        hashes.sort();
        Ok(hashes)
    }
}
