use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::{BlobPut, BlobResult, ByteRange, ByteStream, ResolvedRange, StorageKey};

/// Storage primitives every backend implements.
///
/// Blobs are write-once: `put` on an existing key fails, and a blob only
/// becomes visible to `get`/`head` once it is completely written.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob from a stream
    async fn put(
        &self,
        key: &StorageKey,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult>;

    /// Open a blob for streaming, optionally restricted to a byte range
    async fn get(&self, key: &StorageKey, range: Option<ByteRange>) -> BlobResult<GetResult>;

    /// Blob metadata without content
    async fn head(&self, key: &StorageKey) -> BlobResult<ObjectHead>;

    /// Remove a blob. Missing blobs are not an error.
    async fn delete(&self, key: &StorageKey) -> BlobResult<()>;

    fn capabilities(&self) -> StoreCapabilities;
}

#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
}

pub struct GetResult {
    pub stream: ByteStream,
    /// Size of the whole blob, not of the range
    pub size_bytes: u64,
    pub resolved_range: Option<ResolvedRange>,
}

#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreCapabilities {
    pub supports_range: bool,
}

impl StoreCapabilities {
    pub fn basic() -> Self {
        Self::default()
    }

    pub fn with_range(mut self) -> Self {
        self.supports_range = true;
        self
    }
}

/// Strategy for generating blob keys
pub trait BlobKeyStrategy: Send + Sync {
    fn object_key(&self, put: &BlobPut) -> StorageKey;
}

/// `yyyy/mm/<uuid>.<ext>`; the extension is omitted when none survives
/// sanitising.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyStrategy;

impl DefaultKeyStrategy {
    fn key_at(&self, now: DateTime<Utc>, put: &BlobPut) -> String {
        let id = Uuid::new_v4().simple();
        match put.extension.as_deref() {
            Some(ext) => format!("{:04}/{:02}/{}.{}", now.year(), now.month(), id, ext),
            None => format!("{:04}/{:02}/{}", now.year(), now.month(), id),
        }
    }
}

impl BlobKeyStrategy for DefaultKeyStrategy {
    fn object_key(&self, put: &BlobPut) -> StorageKey {
        let raw = self.key_at(Utc::now(), put);
        // `BlobPut::with_extension` already sanitised; fall back to a bare id
        // if a caller filled `extension` by hand with something odd.
        StorageKey::parse(raw).unwrap_or_else(|_| {
            StorageKey::from_generated(self.key_at(Utc::now(), &BlobPut::default()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keys_are_dated_and_unique() {
        let put = BlobPut::new().with_extension("mp4");
        let a = DefaultKeyStrategy.object_key(&put);
        let b = DefaultKeyStrategy.object_key(&put);
        assert_ne!(a, b);
        assert_eq!(a.extension(), Some("mp4"));
        assert_eq!(a.as_str().split('/').count(), 3);
    }

    #[test]
    fn hand_filled_bad_extension_falls_back() {
        let put = BlobPut {
            extension: Some("../../etc".into()),
            ..BlobPut::default()
        };
        let key = DefaultKeyStrategy.object_key(&put);
        assert_eq!(key.extension(), None);
    }
}
