use std::sync::Arc;

use reel_core::ActorContext;

use crate::delivery::can_view;
use crate::{MediaError, MediaId, MediaRecord, MediaRepository, MediaResult, MediaStatus, RecordFilter};

/// Read side of the record store, filtered by what the actor may see.
#[derive(Clone)]
pub struct Catalog {
    records: Arc<dyn MediaRepository>,
}

impl Catalog {
    pub fn new(records: Arc<dyn MediaRepository>) -> Self {
        Self { records }
    }

    /// Hidden records are reported as missing.
    pub async fn get_for(&self, id: &MediaId, actor: &ActorContext) -> MediaResult<MediaRecord> {
        let record = self.records.get(id).await?;
        if can_view(&record, actor) {
            Ok(record)
        } else {
            Err(MediaError::not_found("media", id.as_str()))
        }
    }

    /// Administrators list anything. Everyone else lists published media,
    /// and may ask for other statuses only when filtering on themselves.
    pub async fn list_for(
        &self,
        actor: &ActorContext,
        filter: RecordFilter,
    ) -> MediaResult<Vec<MediaRecord>> {
        if actor.is_admin() {
            return self.records.list(&filter).await;
        }

        let own = filter
            .owner_ref
            .as_deref()
            .map_or(false, |owner| actor.is(owner));
        let mut scoped = filter.clone();
        match filter.status {
            Some(MediaStatus::Published) => {}
            Some(_) if !own => {
                return Err(MediaError::forbidden(
                    "Only published media can be listed for other owners",
                ))
            }
            Some(_) => {}
            None if !own => scoped.status = Some(MediaStatus::Published),
            None => {}
        }

        scoped.limit = None;
        let visible = self
            .records
            .list(&scoped)
            .await?
            .into_iter()
            .filter(|r| can_view(r, actor))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(visible)
    }
}
