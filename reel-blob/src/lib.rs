//! # reel-blob: write-once blob storage with range reads
//!
//! Uploaded media lands here once it has passed validation. The crate knows
//! nothing about HTTP or moderation; it stores opaque bytes under generated
//! keys and hands them back as bounded-chunk streams, whole or by range.
//!
//! ```text
//! ┌─────────────────┐
//! │   Your Service  │  ← ingest / delivery logic
//! ├─────────────────┤
//! │   BlobAdapter   │  ← key generation, size guard, range resolution
//! ├─────────────────┤
//! │   BlobStore     │  ← storage primitives (FsBlobStore)
//! └─────────────────┘
//! ```
//!
//! ```rust,no_run
//! use reel_blob::prelude::*;
//!
//! # async fn demo() -> BlobResult<()> {
//! let store = FsBlobStore::open("./data/blobs", BlobConfig::default()).await?;
//! let blobs = BlobAdapter::new(store, BlobConfig::default());
//!
//! let body = futures_util::stream::once(async { Ok(bytes::Bytes::from_static(b"hello")) });
//! let receipt = blobs
//!     .put(BlobPut::new().with_extension("txt"), Box::pin(body))
//!     .await?;
//!
//! let opened = blobs.open(&receipt.key, Some(ByteRange::new(0, Some(1)))).await?;
//! assert_eq!(opened.content_length(), 2);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod config;
mod error;
mod fs_store;
mod receipt;
pub mod store;
mod types;

pub use adapter::BlobAdapter;
pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use fs_store::FsBlobStore;
pub use receipt::{BlobReceipt, OpenedBlob, ResolvedRange};
pub use store::{
    BlobKeyStrategy, BlobStore, DefaultKeyStrategy, GetResult, ObjectHead, PutResult,
    StoreCapabilities,
};
pub use types::{sanitize_extension, BlobPut, ByteRange, ByteStream, StorageKey};

pub mod prelude {
    pub use crate::{
        BlobAdapter, BlobConfig, BlobError, BlobPut, BlobReceipt, BlobResult, BlobStore,
        ByteRange, ByteStream, FsBlobStore, OpenedBlob, StorageKey,
    };
}
