use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reel_core::ReelError;
use reel_media::MediaError;

#[derive(Debug)]
pub struct ReelAxumError(pub anyhow::Error);

impl From<anyhow::Error> for ReelAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<ReelError> for ReelAxumError {
    fn from(e: ReelError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<MediaError> for ReelAxumError {
    fn from(e: MediaError) -> Self {
        ReelError::from(e).into()
    }
}

impl IntoResponse for ReelAxumError {
    fn into_response(self) -> Response {
        // Anything that is not a ReelError somewhere in the chain is a 500.
        let reel = ReelError::normalize(self.0);
        if reel.kind.is_server_error() {
            tracing::error!(error = %reel, "request failed");
        }
        let safe = reel.sanitize_for_client();
        let status =
            StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
