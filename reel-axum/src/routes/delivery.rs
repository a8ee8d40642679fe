use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use reel_blob::StorageKey;
use reel_core::ReelError;
use reel_media::{Delivery, MediaId};

use crate::params::{actor_from_headers, range_header};
use crate::{ReelAxumError, ReelState};

pub fn router() -> Router<ReelState> {
    Router::new()
        .route("/media/{id}/content", get(media_content))
        .route("/blobs/{*key}", get(blob_content))
}

async fn media_content(
    State(state): State<ReelState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Response, ReelAxumError> {
    let actor = actor_from_headers(&headers);
    let id = MediaId::parse(&id)?;
    let delivery = state
        .delivery
        .serve_record(&id, &actor, range_header(&headers))
        .await?;
    Ok(into_response(delivery))
}

async fn blob_content(
    State(state): State<ReelState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Response, ReelAxumError> {
    let actor = actor_from_headers(&headers);
    let key = StorageKey::parse(key).map_err(|_| ReelError::not_found("media not found"))?;
    let delivery = state
        .delivery
        .serve_key_for(&key, &actor, range_header(&headers))
        .await?;
    Ok(into_response(delivery))
}

/// Writes status, range headers and the streamed body.
pub fn into_response(delivery: Delivery) -> Response {
    let status = StatusCode::from_u16(delivery.status.status_code()).unwrap_or(StatusCode::OK);

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(delivery.content_length()));
    if let Some(range) = delivery.content_range() {
        if let Ok(value) = HeaderValue::from_str(&range) {
            headers.insert(header::CONTENT_RANGE, value);
        }
    }

    if let Some(disposition) = delivery.content_disposition() {
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    let body = match delivery.body {
        Some(stream) => {
            let content_type = HeaderValue::from_str(&delivery.content_type)
                .unwrap_or(HeaderValue::from_static("application/octet-stream"));
            headers.insert(header::CONTENT_TYPE, content_type);
            Body::from_stream(stream)
        }
        None => Body::empty(),
    };

    (status, headers, body).into_response()
}
