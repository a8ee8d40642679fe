use axum::http::{header, HeaderMap};
use reel_core::{ActorContext, ReelError, Role};

/// Header carrying the authenticated owner reference.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the actor's role; only `admin` is special.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Identity as asserted by the upstream auth layer. Missing headers mean an
/// anonymous viewer.
pub fn actor_from_headers(headers: &HeaderMap) -> ActorContext {
    let role = header_str(headers, ACTOR_ROLE_HEADER)
        .map(Role::parse)
        .unwrap_or(Role::User);
    ActorContext {
        actor_ref: header_str(headers, ACTOR_ID_HEADER).map(str::to_string),
        role,
    }
}

pub fn require_actor(headers: &HeaderMap) -> Result<ActorContext, ReelError> {
    let actor = actor_from_headers(headers);
    if actor.actor_ref.is_none() {
        return Err(ReelError::not_authenticated("An actor identity is required"));
    }
    Ok(actor)
}

pub fn require_admin(headers: &HeaderMap) -> Result<ActorContext, ReelError> {
    let actor = require_actor(headers)?;
    if !actor.is_admin() {
        return Err(ReelError::forbidden("Moderation requires an administrator"));
    }
    Ok(actor)
}

pub fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::RANGE).and_then(|v| v.to_str().ok())
}
