/// Configuration for blob operations
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single blob (safety guard)
    pub max_blob_bytes: u64,

    /// Buffer size for streamed reads; bounds memory per open reader
    pub read_chunk_bytes: usize,

    /// fsync staged data before it becomes visible
    pub sync_on_put: bool,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 1024 * 1024 * 1024, // 1GB
            read_chunk_bytes: 8 * 1024,
            sync_on_put: true,
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Zero is bumped to one byte.
    pub fn with_read_chunk_bytes(mut self, bytes: usize) -> Self {
        self.read_chunk_bytes = bytes.max(1);
        self
    }

    /// Skip fsync; only for tests and throwaway stores.
    pub fn without_sync(mut self) -> Self {
        self.sync_on_put = false;
        self
    }
}
