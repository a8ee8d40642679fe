//! Records as one JSON document per file: `<root>/<id>.json`.
//!
//! Documents are written to a temp file and renamed into place. All records
//! are loaded into memory on open; writes go to disk first, then to the
//! cache. Each record has its own async mutex, held only for that record's
//! read-check-write and dropped from the table once no task holds it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use reel_blob::StorageKey;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    MediaError, MediaId, MediaRecord, MediaRepository, MediaResult, MediaStatus, RecordFilter,
};

#[derive(Debug)]
pub struct FsMediaRepository {
    root: PathBuf,
    cache: DashMap<MediaId, MediaRecord>,
    by_key: DashMap<StorageKey, MediaId>,
    locks: DashMap<MediaId, Arc<Mutex<()>>>,
}

impl FsMediaRepository {
    /// Opens `root`, creating it if needed, and loads every record in it.
    pub async fn open<P: Into<PathBuf>>(root: P) -> MediaResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        let repo = Self {
            root,
            cache: DashMap::new(),
            by_key: DashMap::new(),
            locks: DashMap::new(),
        };

        let mut entries = tokio::fs::read_dir(&repo.root).await?;
        let mut loaded = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<MediaRecord>(&bytes) {
                Ok(record) => {
                    repo.by_key
                        .insert(record.storage_key.clone(), record.id.clone());
                    repo.cache.insert(record.id.clone(), record);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable media record");
                }
            }
        }
        tracing::info!(root = %repo.root.display(), records = loaded, "media records loaded");
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &MediaId) -> PathBuf {
        self.root.join(format!("{}.json", id.as_str()))
    }

    fn lock_for(&self, id: &MediaId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    fn release(&self, id: &MediaId, lock: Arc<Mutex<()>>) {
        drop(lock);
        // The shard lock makes this atomic with `lock_for`.
        self.locks.remove_if(id, |_, l| Arc::strong_count(l) == 1);
    }

    async fn write_record(&self, record: &MediaRecord) -> MediaResult<()> {
        let body = serde_json::to_vec_pretty(record).map_err(MediaError::storage)?;
        let staged = self
            .root
            .join(format!(".{}.{}.tmp", record.id.as_str(), Uuid::new_v4().simple()));

        let written = async {
            let mut file = tokio::fs::File::create(&staged).await?;
            file.write_all(&body).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&staged, self.path_for(&record.id)).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Callers hold the record's lock.
    async fn insert_new(&self, record: MediaRecord) -> MediaResult<MediaRecord> {
        if let Some(existing) = self.cache.get(&record.id) {
            return Err(MediaError::conflict(record.id.as_str(), existing.status));
        }
        self.write_record(&record).await?;
        self.by_key
            .insert(record.storage_key.clone(), record.id.clone());
        self.cache.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn swap_status(
        &self,
        id: &MediaId,
        expected: MediaStatus,
        next: MediaStatus,
        at: DateTime<Utc>,
    ) -> MediaResult<MediaRecord> {
        let mut record = self.get(id).await?;
        if record.status != expected {
            return Err(MediaError::conflict(id.as_str(), record.status));
        }
        record.status = next;
        record.moderated_at = Some(at);

        self.write_record(&record).await?;
        self.cache.insert(id.clone(), record.clone());
        Ok(record)
    }
}

#[async_trait]
impl MediaRepository for FsMediaRepository {
    async fn create(&self, record: MediaRecord) -> MediaResult<MediaRecord> {
        let id = record.id.clone();
        let lock = self.lock_for(&id);
        let result = {
            let _guard = lock.lock().await;
            self.insert_new(record).await
        };
        self.release(&id, lock);
        result
    }

    async fn get(&self, id: &MediaId) -> MediaResult<MediaRecord> {
        self.cache
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
            .cache
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
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.swap_status(id, expected, next, at).await
        };
        self.release(id, lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MediaType, UploadRequest};

    fn pending() -> MediaRecord {
        let request = UploadRequest {
            owner_ref: "alice".into(),
            category_ref: "cat-1".into(),
            title: "demo".into(),
            declared_mime: "video/mp4".into(),
            ..UploadRequest::default()
        };
        let key = StorageKey::parse("2026/10/a.mp4").unwrap();
        MediaRecord::pending(request, key, MediaType::Mp4, 10, Some(1.0))
    }

    #[tokio::test]
    async fn record_locks_are_released_after_use() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsMediaRepository::open(dir.path()).await.unwrap();

        let record = repo.create(pending()).await.unwrap();
        assert!(repo.locks.is_empty());

        repo.compare_and_set_status(&record.id, MediaStatus::Pending, MediaStatus::Published, Utc::now())
            .await
            .unwrap();
        let _ = repo
            .compare_and_set_status(&record.id, MediaStatus::Pending, MediaStatus::Rejected, Utc::now())
            .await;
        assert!(repo.locks.is_empty());
    }
}
