use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use reel_core::ReelError;
use reel_media::{MediaId, MediaRecord, MediaStatus, RecordFilter};
use serde::Deserialize;

use crate::params::actor_from_headers;
use crate::{ReelAxumError, ReelState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub owner: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl ListQuery {
    fn into_filter(self) -> Result<RecordFilter, ReelError> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<MediaStatus>())
            .transpose()
            .map_err(|_| ReelError::bad_request("status must be pending, published or rejected"))?;
        Ok(RecordFilter {
            status,
            owner_ref: self.owner.filter(|o| !o.trim().is_empty()),
            category_ref: self.category.filter(|c| !c.trim().is_empty()),
            limit: self.limit,
        })
    }
}

pub fn router() -> Router<ReelState> {
    Router::new()
        .route("/media", get(list_media))
        .route("/media/{id}", get(get_media))
}

async fn list_media(
    State(state): State<ReelState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MediaRecord>>, ReelAxumError> {
    let actor = actor_from_headers(&headers);
    let filter = query.into_filter()?;
    let records = state.catalog.list_for(&actor, filter).await?;
    Ok(Json(records))
}

async fn get_media(
    State(state): State<ReelState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<MediaRecord>, ReelAxumError> {
    let actor = actor_from_headers(&headers);
    let id = MediaId::parse(&id)?;
    Ok(Json(state.catalog.get_for(&id, &actor).await?))
}
