use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::put;
use axum::{Json, Router};
use reel_core::ReelError;
use reel_media::{MediaId, MediaStatus, ModerationEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::params::require_admin;
use crate::{ReelAxumError, ReelState};

#[derive(Debug, Deserialize)]
pub struct ModerationBody {
    pub event: String,
}

#[derive(Debug, Serialize)]
pub struct ModerationOutcome {
    pub id: MediaId,
    pub status: MediaStatus,
}

fn map_json_rejection(rejection: JsonRejection) -> ReelAxumError {
    ReelError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({ "_schema": [rejection.to_string()] }))
        .into()
}

pub fn router() -> Router<ReelState> {
    Router::new().route("/media/{id}/moderation", put(moderate))
}

async fn moderate(
    State(state): State<ReelState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<Json<ModerationBody>, JsonRejection>,
) -> Result<Json<ModerationOutcome>, ReelAxumError> {
    let moderator = require_admin(&headers)?;
    let Json(body) = body.map_err(map_json_rejection)?;
    let event = body
        .event
        .parse::<ModerationEvent>()
        .map_err(|_| {
            ReelError::bad_request("event must be approve or reject")
                .with_errors(json!({ "event": ["must be approve or reject"] }))
        })?;
    let id = MediaId::parse(&id)?;

    tracing::debug!(media_id = %id, %event, moderator = ?moderator.actor_ref, "moderation requested");
    let status = state.moderator.transition(&id, event).await?;
    Ok(Json(ModerationOutcome { id, status }))
}
