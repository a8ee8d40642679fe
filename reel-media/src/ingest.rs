use std::sync::Arc;

use futures_util::StreamExt;
use reel_blob::{BlobAdapter, BlobPut, ByteStream};
use tracing::{info, instrument, warn};

use crate::probe::inspect;
use crate::{
    IngestValidator, MediaError, MediaRecord, MediaRepository, MediaResult, PolicyProfile, Spool,
    SpoolWriter, SpooledUpload, UploadFacts, UploadRequest, ValidationError,
};

/// Upload pipeline: spool, inspect, validate, store the blob, create the
/// pending record.
///
/// Nothing reaches the blob store before validation succeeds, so a refused
/// upload leaves neither a blob nor a record behind.
#[derive(Clone)]
pub struct IngestService {
    blobs: BlobAdapter,
    records: Arc<dyn MediaRepository>,
    validator: IngestValidator,
    spool: Spool,
}

impl IngestService {
    pub fn new(
        blobs: BlobAdapter,
        records: Arc<dyn MediaRepository>,
        validator: IngestValidator,
        spool: Spool,
    ) -> Self {
        Self {
            blobs,
            records,
            validator,
            spool,
        }
    }

    pub fn validator(&self) -> &IngestValidator {
        &self.validator
    }

    pub fn spool(&self) -> &Spool {
        &self.spool
    }

    /// Ingests `body` under `profile`.
    #[instrument(skip_all, fields(profile = %profile, declared = %request.declared_mime))]
    pub async fn ingest(
        &self,
        profile: PolicyProfile,
        request: UploadRequest,
        mut body: ByteStream,
    ) -> MediaResult<MediaRecord> {
        let result = async {
            let request = request.normalized()?;
            self.validator
                .check_declared_type(profile, &request.declared_mime)?;
            let max_bytes = self.validator.policy(profile).max_bytes;
            let mut writer = self.spool.begin(max_bytes).await?;
            while let Some(chunk) = body.next().await {
                self.spool_chunk(profile, &request.declared_mime, &mut writer, &chunk?)
                    .await?;
            }
            let spooled = writer.finish().await?;
            self.commit(profile, request, spooled).await
        }
        .await;
        result.map_err(|e| e.reported("ingest"))
    }

    /// Appends one body chunk to `writer`. When the chunk crosses the size
    /// cap and the bytes seen so far already fail the type rule, the type
    /// failure is reported instead.
    pub async fn spool_chunk(
        &self,
        profile: PolicyProfile,
        declared_mime: &str,
        writer: &mut SpoolWriter,
        chunk: &[u8],
    ) -> MediaResult<()> {
        match writer.write(chunk).await {
            Err(MediaError::Validation(overflow @ ValidationError::TooLarge { .. })) => {
                let ranked =
                    self.validator
                        .rank_overflow(profile, declared_mime, writer.head(), overflow);
                Err(ranked.into())
            }
            other => other,
        }
    }

    /// Ingests a body the caller has already spooled.
    #[instrument(skip_all, fields(profile = %profile, size_bytes = spooled.size_bytes()))]
    pub async fn ingest_spooled(
        &self,
        profile: PolicyProfile,
        request: UploadRequest,
        spooled: SpooledUpload,
    ) -> MediaResult<MediaRecord> {
        let result = async {
            let request = request.normalized()?;
            self.validator
                .check_declared_type(profile, &request.declared_mime)?;
            self.commit(profile, request, spooled).await
        }
        .await;
        result.map_err(|e| e.reported("ingest"))
    }

    async fn commit(
        &self,
        profile: PolicyProfile,
        request: UploadRequest,
        spooled: SpooledUpload,
    ) -> MediaResult<MediaRecord> {
        let inspection = inspect(spooled.path().to_path_buf()).await?;
        let facts = UploadFacts {
            declared_mime: request.declared_mime.clone(),
            sniffed: inspection.sniffed,
            size_bytes: spooled.size_bytes(),
            duration_secs: inspection.duration_secs,
        };
        let media_type = self.validator.validate(profile, &facts)?;

        let put = BlobPut::new()
            .with_content_type(media_type.mime())
            .with_extension(media_type.extension())
            .with_size_hint(facts.size_bytes);
        let body = spooled
            .stream(self.blobs.config().read_chunk_bytes)
            .await?;
        let receipt = self.blobs.put(put, body).await?;
        drop(spooled);

        let record = MediaRecord::pending(
            request,
            receipt.key.clone(),
            media_type,
            receipt.size_bytes,
            facts.duration_secs,
        );
        match self.records.create(record).await {
            Ok(record) => {
                info!(
                    media_id = %record.id,
                    storage_key = %record.storage_key,
                    size_bytes = record.size_bytes,
                    mime_type = %record.mime_type,
                    "media ingested"
                );
                Ok(record)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&receipt.key).await {
                    warn!(storage_key = %receipt.key, error = %cleanup, "orphaned blob left behind");
                }
                Err(e)
            }
        }
    }
}
