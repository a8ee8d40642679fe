use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reel_blob::StorageKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MediaError, MediaResult, MediaType};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_REF_CHARS: usize = 128;

/// Record identifier. Always a UUID, which keeps it safe as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn parse(raw: &str) -> MediaResult<Self> {
        Uuid::parse_str(raw.trim())
            .map(|id| Self(id.to_string()))
            .map_err(|_| MediaError::not_found("media", raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Pending,
    Published,
    Rejected,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Pending => "pending",
            MediaStatus::Published => "published",
            MediaStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MediaStatus::Pending)
    }
}

impl fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaStatus {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MediaStatus::Pending),
            "published" => Ok(MediaStatus::Published),
            "rejected" => Ok(MediaStatus::Rejected),
            _ => Err(MediaError::invalid_field("status", "must be pending, published or rejected")),
        }
    }
}

/// Metadata for one uploaded item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: MediaId,
    pub owner_ref: String,
    pub category_ref: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub storage_key: StorageKey,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    pub status: MediaStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderated_at: Option<DateTime<Utc>>,
}

/// What the uploader supplies alongside the bytes.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub owner_ref: String,
    pub category_ref: String,
    pub title: String,
    pub description: Option<String>,
    /// MIME type as declared by the client; checked, never stored.
    pub declared_mime: String,
    pub original_filename: Option<String>,
}

impl UploadRequest {
    /// Trims text fields and checks presence and length bounds.
    pub fn normalized(mut self) -> MediaResult<Self> {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut fail = |field: &str, problem: String| {
            errors.entry(field.to_string()).or_default().push(problem);
        };

        self.owner_ref = self.owner_ref.trim().to_string();
        self.category_ref = self.category_ref.trim().to_string();
        self.title = self.title.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.original_filename = self
            .original_filename
            .map(|f| f.trim().chars().take(255).collect::<String>())
            .filter(|f| !f.is_empty());

        if self.owner_ref.is_empty() {
            fail("owner", "required".to_string());
        } else if self.owner_ref.chars().count() > MAX_REF_CHARS {
            fail("owner", format!("at most {MAX_REF_CHARS} characters"));
        }
        if self.category_ref.is_empty() {
            fail("category", "required".to_string());
        } else if self.category_ref.chars().count() > MAX_REF_CHARS {
            fail("category", format!("at most {MAX_REF_CHARS} characters"));
        }
        if self.title.is_empty() {
            fail("title", "required".to_string());
        } else if self.title.chars().count() > MAX_TITLE_CHARS {
            fail("title", format!("at most {MAX_TITLE_CHARS} characters"));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                fail("description", format!("at most {MAX_DESCRIPTION_CHARS} characters"));
            }
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(MediaError::Invalid {
                message: "Invalid upload".to_string(),
                errors,
            })
        }
    }
}

impl MediaRecord {
    /// A fresh record for a blob that has just been committed.
    pub fn pending(
        request: UploadRequest,
        storage_key: StorageKey,
        media_type: MediaType,
        size_bytes: u64,
        duration_seconds: Option<f64>,
    ) -> Self {
        Self {
            id: MediaId::generate(),
            owner_ref: request.owner_ref,
            category_ref: request.category_ref,
            title: request.title,
            description: request.description,
            storage_key,
            mime_type: media_type.mime().to_string(),
            size_bytes,
            duration_seconds,
            original_filename: request.original_filename,
            status: MediaStatus::Pending,
            created_at: Utc::now(),
            moderated_at: None,
        }
    }
}

/// Listing criteria. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: Option<MediaStatus>,
    pub owner_ref: Option<String>,
    pub category_ref: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn with_status(status: MediaStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &MediaRecord) -> bool {
        self.status.map_or(true, |s| record.status == s)
            && self.owner_ref.as_deref().map_or(true, |o| record.owner_ref == o)
            && self
                .category_ref
                .as_deref()
                .map_or(true, |c| record.category_ref == c)
    }

    /// Sorts newest first (ties broken by id) and applies `limit`.
    pub fn finish(&self, mut records: Vec<MediaRecord>) -> Vec<MediaRecord> {
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        records
    }
}
