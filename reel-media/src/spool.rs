//! Temporary holding area for upload bodies while they are validated.
//!
//! Spooled files are deleted when dropped, whether the upload was accepted,
//! refused or abandoned. They are never visible through the blob store.

use std::path::{Path, PathBuf};

use reel_blob::ByteStream;
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::probe::SNIFF_LEN;
use crate::{MediaError, MediaResult, ValidationError};

#[derive(Debug, Clone)]
pub struct Spool {
    dir: PathBuf,
}

impl Spool {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Spool under the system temp directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Starts a new spooled upload capped at `max_bytes`.
    pub async fn begin(&self, max_bytes: u64) -> MediaResult<SpoolWriter> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let dir = self.dir.clone();
        let temp = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix("reel-upload-")
                .suffix(".part")
                .tempfile_in(dir)
        })
        .await
        .map_err(MediaError::storage)??;

        let (file, path) = temp.into_parts();
        Ok(SpoolWriter {
            file: File::from_std(file),
            path,
            head: Vec::with_capacity(SNIFF_LEN),
            written: 0,
            max_bytes,
        })
    }
}

pub struct SpoolWriter {
    file: File,
    path: TempPath,
    head: Vec<u8>,
    written: u64,
    max_bytes: u64,
}

impl SpoolWriter {
    /// Appends a chunk, failing with `TooLarge` as soon as the cap is
    /// crossed. The partial file is discarded with the writer.
    pub async fn write(&mut self, chunk: &[u8]) -> MediaResult<()> {
        let wanted = SNIFF_LEN.saturating_sub(self.head.len()).min(chunk.len());
        self.head.extend_from_slice(&chunk[..wanted]);

        let next = self.written + chunk.len() as u64;
        if next > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes: next,
                max_bytes: self.max_bytes,
            }
            .into());
        }
        self.file.write_all(chunk).await?;
        self.written = next;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// The first bytes offered to the writer, including those of a chunk
    /// refused for crossing the cap.
    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub async fn finish(mut self) -> MediaResult<SpooledUpload> {
        self.file.flush().await?;
        Ok(SpooledUpload {
            path: self.path,
            size_bytes: self.written,
        })
    }
}

/// A complete upload body on local disk.
#[derive(Debug)]
pub struct SpooledUpload {
    path: TempPath,
    size_bytes: u64,
}

impl SpooledUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Streams the spooled bytes back in `chunk_bytes` pieces.
    pub async fn stream(&self, chunk_bytes: usize) -> MediaResult<ByteStream> {
        let file = File::open(&self.path).await?;
        Ok(Box::pin(ReaderStream::with_capacity(file, chunk_bytes.max(1))))
    }
}
