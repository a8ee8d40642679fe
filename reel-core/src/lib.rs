//! reel-core: transport-agnostic building blocks shared by the reel crates.

pub mod actor;
pub mod config;
pub mod errors;

pub use actor::{ActorContext, Role};
pub use config::{ReelConfig, ReelConfigSnapshot};
pub use errors::{ErrorKind, ReelError, ReelResult};
