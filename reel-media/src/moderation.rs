//! Moderation state machine.
//!
//! ```text
//! pending --approve--> published
//! pending --reject---> rejected
//! ```
//!
//! `published` and `rejected` are terminal: every event on them is a
//! `Conflict`. When several moderators race on one pending record exactly
//! one wins; the others observe `Conflict`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{MediaError, MediaId, MediaRepository, MediaResult, MediaStatus, RecordFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationEvent {
    Approve,
    Reject,
}

impl ModerationEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationEvent::Approve => "approve",
            ModerationEvent::Reject => "reject",
        }
    }
}

impl fmt::Display for ModerationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationEvent {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(ModerationEvent::Approve),
            "reject" => Ok(ModerationEvent::Reject),
            _ => Err(MediaError::invalid_field("event", "must be approve or reject")),
        }
    }
}

impl MediaStatus {
    /// The status `event` leads to, or `None` if this status is terminal.
    pub fn apply(self, event: ModerationEvent) -> Option<MediaStatus> {
        match (self, event) {
            (MediaStatus::Pending, ModerationEvent::Approve) => Some(MediaStatus::Published),
            (MediaStatus::Pending, ModerationEvent::Reject) => Some(MediaStatus::Rejected),
            (MediaStatus::Published | MediaStatus::Rejected, _) => None,
        }
    }
}

#[derive(Clone)]
pub struct Moderator {
    records: Arc<dyn MediaRepository>,
}

impl Moderator {
    pub fn new(records: Arc<dyn MediaRepository>) -> Self {
        Self { records }
    }

    /// Applies `event` to record `id` and returns the new status.
    #[instrument(skip(self), fields(media_id = %id))]
    pub async fn transition(
        &self,
        id: &MediaId,
        event: ModerationEvent,
    ) -> MediaResult<MediaStatus> {
        let result = self.try_transition(id, event).await;
        match &result {
            Ok(status) => info!(%event, %status, "moderation applied"),
            Err(MediaError::Conflict { status, .. }) => {
                info!(%event, current = %status, "moderation refused, record is terminal")
            }
            Err(_) => {}
        }
        result.map_err(|e| e.reported("moderate"))
    }

    async fn try_transition(
        &self,
        id: &MediaId,
        event: ModerationEvent,
    ) -> MediaResult<MediaStatus> {
        let record = self.records.get(id).await?;
        let next = record
            .status
            .apply(event)
            .ok_or_else(|| MediaError::conflict(id.as_str(), record.status))?;

        // The swap re-checks the status; a concurrent winner makes it fail.
        let updated = self
            .records
            .compare_and_set_status(id, record.status, next, Utc::now())
            .await?;
        Ok(updated.status)
    }

    /// The moderation queue: pending records, newest first.
    pub async fn pending(&self, limit: Option<usize>) -> MediaResult<Vec<crate::MediaRecord>> {
        let filter = RecordFilter {
            limit,
            ..RecordFilter::with_status(MediaStatus::Pending)
        };
        self.records.list(&filter).await
    }
}
