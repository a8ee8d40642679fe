//! Multipart uploads. The `file` part is streamed straight into the spool;
//! nothing is buffered in memory beyond one chunk.

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use reel_core::ReelError;
use reel_media::{MediaError, MediaRecord, PolicyProfile, SpooledUpload, UploadRequest};

use crate::params::actor_from_headers;
use crate::{ReelAxumError, ReelState};

/// Cap on each text field of the form.
const TEXT_FIELD_LIMIT: u64 = 16 * 1024;

pub fn router() -> Router<ReelState> {
    Router::new()
        .route("/clips", post(upload_clip))
        .route("/uploads", post(upload_unrestricted))
        .layer(DefaultBodyLimit::disable())
}

async fn upload_clip(
    State(state): State<ReelState>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<MediaRecord>), ReelAxumError> {
    upload(state, PolicyProfile::ShortForm, headers, body).await
}

async fn upload_unrestricted(
    State(state): State<ReelState>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<MediaRecord>), ReelAxumError> {
    upload(state, PolicyProfile::Unrestricted, headers, body).await
}

fn multipart_error(err: multer::Error) -> ReelAxumError {
    match err {
        multer::Error::FieldSizeExceeded { field_name, .. } => MediaError::invalid_field(
            field_name.as_deref().unwrap_or("form"),
            "field is too long",
        )
        .into(),
        other => ReelError::bad_request(format!("Malformed multipart body: {other}")).into(),
    }
}

async fn upload(
    state: ReelState,
    profile: PolicyProfile,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<MediaRecord>), ReelAxumError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| ReelError::bad_request("Expected a multipart/form-data body"))?;

    let constraints = multer::Constraints::new().size_limit(
        multer::SizeLimit::new()
            .per_field(TEXT_FIELD_LIMIT)
            .for_field("file", u64::MAX),
    );
    let mut multipart =
        multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let actor = actor_from_headers(&headers);
    let mut request = UploadRequest::default();
    let mut form_owner = None;
    let mut spooled: Option<SpooledUpload> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if spooled.is_some() {
                    return Err(MediaError::invalid_field("file", "only one file per upload").into());
                }
                let declared = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_default();
                // Refuse unacceptable types before reading the body.
                state
                    .ingest
                    .validator()
                    .check_declared_type(profile, &declared)
                    .map_err(MediaError::from)?;

                request.original_filename = field.file_name().map(str::to_string);
                let max_bytes = state.ingest.validator().policy(profile).max_bytes;
                let mut writer = state.ingest.spool().begin(max_bytes).await?;
                while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                    state
                        .ingest
                        .spool_chunk(profile, &declared, &mut writer, &chunk)
                        .await?;
                }
                request.declared_mime = declared;
                spooled = Some(writer.finish().await?);
            }
            "title" => request.title = field.text().await.map_err(multipart_error)?,
            "category" => request.category_ref = field.text().await.map_err(multipart_error)?,
            "description" => {
                request.description = Some(field.text().await.map_err(multipart_error)?)
            }
            "owner" => form_owner = Some(field.text().await.map_err(multipart_error)?),
            _ => tracing::debug!(field = %name, "ignoring unknown form field"),
        }
    }

    // The trusted header wins; the form field is the fallback.
    request.owner_ref = match actor.actor_ref.or(form_owner) {
        Some(owner) if !owner.trim().is_empty() => owner,
        _ => return Err(ReelError::not_authenticated("An actor identity is required").into()),
    };
    let spooled =
        spooled.ok_or_else(|| MediaError::invalid_field("file", "required"))?;

    let record = state
        .ingest
        .ingest_spooled(profile, request, spooled)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
