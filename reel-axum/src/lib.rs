//! reel-axum: HTTP surface for reel.
//!
//! Routes uploads into the ingest pipeline, exposes moderation to
//! administrators and serves media with byte-range support. Errors leave
//! as Feathers-style JSON bodies.

pub mod app;
mod error;
pub mod params;
pub mod routes;
pub mod state;

pub use app::ReelApp;
pub use error::ReelAxumError;
pub use state::ReelState;
