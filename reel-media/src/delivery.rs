//! Byte-range delivery of stored media.

use std::sync::Arc;

use reel_blob::{BlobAdapter, BlobError, ByteRange, ByteStream, ResolvedRange, StorageKey};
use reel_core::ActorContext;
use tracing::debug;

use crate::{MediaError, MediaId, MediaRecord, MediaRepository, MediaResult, MediaStatus, MediaType};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const MAX_FILENAME_CHARS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Full,
    Partial,
    RangeNotSatisfiable,
}

impl DeliveryStatus {
    pub fn status_code(&self) -> u16 {
        match self {
            DeliveryStatus::Full => 200,
            DeliveryStatus::Partial => 206,
            DeliveryStatus::RangeNotSatisfiable => 416,
        }
    }
}

/// A response ready to be written by a transport.
pub struct Delivery {
    pub status: DeliveryStatus,
    pub content_type: String,
    pub total_size: u64,
    pub range: Option<ResolvedRange>,
    /// Display name offered in `Content-Disposition`.
    pub filename: Option<String>,
    /// `None` for 416.
    pub body: Option<ByteStream>,
}

impl Delivery {
    pub fn content_length(&self) -> u64 {
        match (self.status, self.range) {
            (DeliveryStatus::RangeNotSatisfiable, _) => 0,
            (_, Some(range)) => range.content_length(),
            (_, None) => self.total_size,
        }
    }

    /// `Content-Range` value for 206 and 416, `None` for 200.
    pub fn content_range(&self) -> Option<String> {
        match self.status {
            DeliveryStatus::Full => None,
            DeliveryStatus::Partial => self.range.map(|r| r.content_range()),
            DeliveryStatus::RangeNotSatisfiable => Some(format!("bytes */{}", self.total_size)),
        }
    }

    /// `inline; filename="..."` when there is a body and a display name.
    pub fn content_disposition(&self) -> Option<String> {
        self.body.as_ref()?;
        self.filename
            .as_deref()
            .map(|name| format!("inline; filename=\"{name}\""))
    }
}

/// Reduces a client-supplied filename to something safe to echo in a
/// header: last path segment only, ASCII letters, digits, `.`, `-`, `_`
/// and spaces.
pub fn display_filename(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .take(MAX_FILENAME_CHARS)
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("total_size", &self.total_size)
            .field("range", &self.range)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// Whether `actor` may see `record` at all.
///
/// Published media is public. Pending media is visible to its owner and to
/// administrators; rejected media only to administrators.
pub fn can_view(record: &MediaRecord, actor: &ActorContext) -> bool {
    match record.status {
        MediaStatus::Published => true,
        MediaStatus::Pending => actor.is_admin() || actor.is(&record.owner_ref),
        MediaStatus::Rejected => actor.is_admin(),
    }
}

#[derive(Clone)]
pub struct DeliveryService {
    blobs: BlobAdapter,
    records: Arc<dyn MediaRepository>,
}

impl DeliveryService {
    pub fn new(blobs: BlobAdapter, records: Arc<dyn MediaRepository>) -> Self {
        Self { blobs, records }
    }

    /// Serves the blob at `key` without looking at moderation status.
    ///
    /// A missing, malformed or multi-range header serves the whole blob.
    pub async fn serve(&self, key: &StorageKey, range_header: Option<&str>) -> MediaResult<Delivery> {
        let content_type = key
            .extension()
            .and_then(MediaType::from_extension)
            .map_or(FALLBACK_CONTENT_TYPE, |t| t.mime())
            .to_string();
        self.serve_as(key, content_type, range_header).await
    }

    /// Serves the media behind record `id` if `actor` may see it.
    pub async fn serve_record(
        &self,
        id: &MediaId,
        actor: &ActorContext,
        range_header: Option<&str>,
    ) -> MediaResult<Delivery> {
        let record = self.records.get(id).await?;
        self.serve_visible(record, actor, range_header).await
    }

    /// Serves `key` if it belongs to a record `actor` may see.
    pub async fn serve_key_for(
        &self,
        key: &StorageKey,
        actor: &ActorContext,
        range_header: Option<&str>,
    ) -> MediaResult<Delivery> {
        let record = self.records.find_by_storage_key(key).await?;
        self.serve_visible(record, actor, range_header).await
    }

    async fn serve_visible(
        &self,
        record: MediaRecord,
        actor: &ActorContext,
        range_header: Option<&str>,
    ) -> MediaResult<Delivery> {
        if !can_view(&record, actor) {
            debug!(media_id = %record.id, status = %record.status, "hidden from actor");
            return Err(MediaError::not_found("media", record.id.as_str()));
        }
        let mut delivery = self
            .serve_as(&record.storage_key, record.mime_type, range_header)
            .await?;
        delivery.filename = record.original_filename.as_deref().and_then(display_filename);
        Ok(delivery)
    }

    async fn serve_as(
        &self,
        key: &StorageKey,
        content_type: String,
        range_header: Option<&str>,
    ) -> MediaResult<Delivery> {
        let range = range_header.and_then(ByteRange::parse_header);
        let result = match self.blobs.open(key, range).await {
            Ok(opened) => {
                let status = if opened.is_partial() {
                    DeliveryStatus::Partial
                } else {
                    DeliveryStatus::Full
                };
                Ok(Delivery {
                    status,
                    content_type,
                    total_size: opened.total_size,
                    range: opened.range,
                    filename: None,
                    body: Some(opened.stream),
                })
            }
            Err(BlobError::RangeNotSatisfiable { total_size }) => Ok(Delivery {
                status: DeliveryStatus::RangeNotSatisfiable,
                content_type,
                total_size,
                range: None,
                filename: None,
                body: None,
            }),
            Err(e) => Err(MediaError::from(e)),
        };
        result.map_err(|e| e.reported("serve"))
    }
}
