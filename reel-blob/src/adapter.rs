use std::sync::Arc;

use crate::{
    BlobConfig, BlobError, BlobKeyStrategy, BlobPut, BlobReceipt, BlobResult, BlobStore,
    ByteRange, ByteStream, DefaultKeyStrategy, OpenedBlob, StorageKey,
};

/// What services embed: a store plus key generation and size guards.
#[derive(Clone)]
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    config: BlobConfig,
}

impl BlobAdapter {
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self {
            store: Arc::new(store),
            keys: Arc::new(DefaultKeyStrategy),
            config,
        }
    }

    /// Stores `body` under a freshly generated key.
    pub async fn put(&self, put: BlobPut, body: ByteStream) -> BlobResult<BlobReceipt> {
        if let Some(size) = put.size_hint {
            if size > self.config.max_blob_bytes {
                return Err(BlobError::TooLarge {
                    max_bytes: self.config.max_blob_bytes,
                });
            }
        }

        let key = self.keys.object_key(&put);
        let result = self
            .store
            .put(&key, put.content_type.as_deref(), body)
            .await?;

        let mut receipt = BlobReceipt::new(key, result.size_bytes);
        if let Some(ct) = put.content_type {
            receipt = receipt.with_content_type(ct);
        }
        if self.store.capabilities().supports_range {
            receipt = receipt.with_range_support();
        }
        Ok(receipt)
    }

    /// Opens a blob, optionally restricted to `range`.
    ///
    /// Fails with `NotFound` for unknown keys and `RangeNotSatisfiable`
    /// when the range starts past the end.
    pub async fn open(&self, key: &StorageKey, range: Option<ByteRange>) -> BlobResult<OpenedBlob> {
        let range = match range {
            Some(_) if !self.supports_ranges() => return Err(BlobError::Unsupported),
            other => other,
        };
        let got = self.store.get(key, range).await?;
        Ok(OpenedBlob {
            key: key.clone(),
            total_size: got.size_bytes,
            range: got.resolved_range,
            stream: got.stream,
        })
    }

    pub async fn size(&self, key: &StorageKey) -> BlobResult<u64> {
        Ok(self.store.head(key).await?.size_bytes)
    }

    pub async fn delete(&self, key: &StorageKey) -> BlobResult<()> {
        self.store.delete(key).await
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }

    pub fn supports_ranges(&self) -> bool {
        self.store.capabilities().supports_range
    }
}
