use axum::routing::get;
use axum::Router;

use crate::ReelState;

pub mod delivery;
pub mod media;
pub mod moderation;
pub mod upload;

async fn health() -> &'static str {
    "ok"
}

pub fn router() -> Router<ReelState> {
    Router::new()
        .route("/health", get(health))
        .merge(upload::router())
        .merge(media::router())
        .merge(moderation::router())
        .merge(delivery::router())
}
