use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reel_blob::StorageKey;

use crate::{MediaError, MediaId, MediaRecord, MediaResult, MediaStatus, RecordFilter};

/// Durable home of media metadata.
///
/// Status only changes through [`MediaRepository::compare_and_set_status`],
/// which must be atomic per record and must not serialize unrelated records.
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Inserts a new record. Fails with `Conflict` if the id is taken.
    async fn create(&self, record: MediaRecord) -> MediaResult<MediaRecord>;

    async fn get(&self, id: &MediaId) -> MediaResult<MediaRecord>;

    async fn find_by_storage_key(&self, key: &StorageKey) -> MediaResult<MediaRecord>;

    /// Matching records, newest first.
    async fn list(&self, filter: &RecordFilter) -> MediaResult<Vec<MediaRecord>>;

    /// Moves `id` from `expected` to `next`, stamping `moderated_at`.
    ///
    /// Fails with `Conflict` carrying the current status if the record is
    /// no longer in `expected`, and with `NotFound` if it does not exist.
    async fn compare_and_set_status(
        &self,
        id: &MediaId,
        expected: MediaStatus,
        next: MediaStatus,
        at: DateTime<Utc>,
    ) -> MediaResult<MediaRecord>;
}

/// In-process repository. Each record sits in its own map entry, so a
/// status swap only locks that entry's shard.
#[derive(Debug, Default)]
pub struct MemoryMediaRepository {
    records: DashMap<MediaId, MediaRecord>,
    by_key: DashMap<StorageKey, MediaId>,
}

impl MemoryMediaRepository {
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
impl MediaRepository for MemoryMediaRepository {
    async fn create(&self, record: MediaRecord) -> MediaResult<MediaRecord> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(existing) => {
                Err(MediaError::conflict(record.id.as_str(), existing.get().status))
            }
            Entry::Vacant(slot) => {
                self.by_key
                    .insert(record.storage_key.clone(), record.id.clone());
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get(&self, id: &MediaId) -> MediaResult<MediaRecord> {
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| MediaError::not_found("media", id.as_str()))
    }

    async fn find_by_storage_key(&self, key: &StorageKey) -> MediaResult<MediaRecord> {
        let id = self
            .by_key
            .get(key)
            .map(|id| id.value().clone())
            .ok_or_else(|| MediaError::not_found("media", key.as_str()))?;
        self.get(&id).await
    }

    async fn list(&self, filter: &RecordFilter) -> MediaResult<Vec<MediaRecord>> {
        let matching = self
            .records
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        Ok(filter.finish(matching))
    }

    async fn compare_and_set_status(
        &self,
        id: &MediaId,
        expected: MediaStatus,
        next: MediaStatus,
        at: DateTime<Utc>,
    ) -> MediaResult<MediaRecord> {
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| MediaError::not_found("media", id.as_str()))?;
        if entry.status != expected {
            return Err(MediaError::conflict(id.as_str(), entry.status));
        }
        entry.status = next;
        entry.moderated_at = Some(at);
        Ok(entry.clone())
    }
}
