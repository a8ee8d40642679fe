use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ByteStream, StorageKey};

/// Receipt returned after successfully storing a blob
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobReceipt {
    pub key: StorageKey,
    pub size_bytes: u64,
    pub content_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub accepts_ranges: bool,
}

impl BlobReceipt {
    pub fn new(key: StorageKey, size_bytes: u64) -> Self {
        Self {
            key,
            size_bytes,
            content_type: None,
            created_at: Utc::now(),
            accepts_ranges: false,
        }
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_range_support(mut self) -> Self {
        self.accepts_ranges = true;
        self
    }
}

/// A range resolved against a concrete blob size. `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
}

impl ResolvedRange {
    pub fn content_length(&self) -> u64 {
        if self.total_size == 0 {
            return 0;
        }
        self.end - self.start + 1
    }

    /// `Content-Range` value, e.g. `bytes 0-99/1000`.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// An open, readable blob. Dropping it closes the underlying handle.
pub struct OpenedBlob {
    pub key: StorageKey,
    pub total_size: u64,
    /// Set when the reader asked for a range.
    pub range: Option<ResolvedRange>,
    pub stream: ByteStream,
}

impl OpenedBlob {
    pub fn is_partial(&self) -> bool {
        self.range.is_some()
    }

    pub fn content_length(&self) -> u64 {
        self.range
            .map_or(self.total_size, |r| r.content_length())
    }
}

impl std::fmt::Debug for OpenedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedBlob")
            .field("key", &self.key)
            .field("total_size", &self.total_size)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}
