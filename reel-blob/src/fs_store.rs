//! Local filesystem backend.
//!
//! Layout under `root`:
//! - `<key>` for committed blobs
//! - `.staging/<uuid>.part` for writes in flight
//!
//! Keys can never start with a dot, so staging files are unreachable
//! through `get`/`head`.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{
    BlobConfig, BlobError, BlobResult, BlobStore, ByteRange, ByteStream, GetResult, ObjectHead,
    PutResult, StorageKey, StoreCapabilities,
};

const STAGING_DIR: &str = ".staging";

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    staging: PathBuf,
    config: BlobConfig,
}

impl FsBlobStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open<P: Into<PathBuf>>(root: P, config: BlobConfig) -> BlobResult<Self> {
        let root = root.into();
        let staging = root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging).await?;
        Ok(Self {
            root,
            staging,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    async fn write_staged(&self, staged: &Path, mut stream: ByteStream) -> BlobResult<u64> {
        let mut file = File::create(staged).await?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            if written > self.config.max_blob_bytes {
                return Err(BlobError::TooLarge {
                    max_bytes: self.config.max_blob_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        if self.config.sync_on_put {
            file.sync_all().await?;
        }
        Ok(written)
    }
}

/// Removes a staging file unless the write was committed. Runs on error
/// returns and when the put future is dropped mid-upload.
struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn modified_at(meta: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    meta.modified().ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        key: &StorageKey,
        _content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let final_path = self.path_for(key);
        if tokio::fs::try_exists(&final_path).await? {
            return Err(BlobError::AlreadyExists {
                key: key.to_string(),
            });
        }

        let staged = self
            .staging
            .join(format!("{}.part", Uuid::new_v4().simple()));
        let mut guard = StagingGuard::new(staged.clone());

        let size_bytes = self.write_staged(&staged, stream).await?;

        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&staged, &final_path).await?;
        guard.disarm();

        tracing::debug!(key = %key, size_bytes, "blob committed");
        Ok(PutResult { size_bytes })
    }

    async fn get(&self, key: &StorageKey, range: Option<ByteRange>) -> BlobResult<GetResult> {
        let path = self.path_for(key);
        let mut file = File::open(&path)
            .await
            .map_err(|e| BlobError::from_io(e, key.as_str()))?;
        // Size from the open handle, not a second stat of the path.
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(BlobError::not_found(key.as_str()));
        }
        let size_bytes = meta.len();
        let chunk = self.config.read_chunk_bytes;

        let (stream, resolved_range): (ByteStream, _) = match range {
            Some(range) => {
                let resolved = range.resolve(size_bytes)?;
                file.seek(SeekFrom::Start(resolved.start)).await?;
                let body = file.take(resolved.content_length());
                (
                    Box::pin(ReaderStream::with_capacity(body, chunk)),
                    Some(resolved),
                )
            }
            None => (Box::pin(ReaderStream::with_capacity(file, chunk)), None),
        };

        Ok(GetResult {
            stream,
            size_bytes,
            resolved_range,
        })
    }

    async fn head(&self, key: &StorageKey) -> BlobResult<ObjectHead> {
        let meta = tokio::fs::metadata(self.path_for(key))
            .await
            .map_err(|e| BlobError::from_io(e, key.as_str()))?;
        if !meta.is_file() {
            return Err(BlobError::not_found(key.as_str()));
        }
        Ok(ObjectHead {
            size_bytes: meta.len(),
            last_modified: modified_at(&meta),
        })
    }

    async fn delete(&self, key: &StorageKey) -> BlobResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().with_range()
    }
}
