//! Named ingest policies.
//!
//! The clip path (`ShortForm`) and the general upload path (`Unrestricted`)
//! accept different types, sizes and durations. Each is configured on its
//! own; callers pick one by name.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reel_core::ReelConfigSnapshot;
use serde::{Deserialize, Serialize};

use crate::{MediaError, MediaType};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyProfile {
    ShortForm,
    Unrestricted,
}

impl PolicyProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyProfile::ShortForm => "short_form",
            PolicyProfile::Unrestricted => "unrestricted",
        }
    }
}

impl fmt::Display for PolicyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyProfile {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "short_form" | "short" | "clip" => Ok(PolicyProfile::ShortForm),
            "unrestricted" | "upload" => Ok(PolicyProfile::Unrestricted),
            _ => Err(MediaError::invalid_field("profile", "unknown ingest profile")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestPolicy {
    pub allowed: Vec<MediaType>,
    pub max_bytes: u64,
    /// `None` means videos of any length are accepted.
    pub max_duration: Option<Duration>,
}

impl IngestPolicy {
    /// Short clips: mp4 video up to a minute, or a still image; 25 MiB.
    pub fn short_form() -> Self {
        Self {
            allowed: vec![MediaType::Mp4, MediaType::Jpeg, MediaType::Png],
            max_bytes: 25 * MIB,
            max_duration: Some(Duration::from_secs(60)),
        }
    }

    /// Long-form video in the common containers; 500 MiB, no length cap.
    pub fn unrestricted() -> Self {
        Self {
            allowed: vec![
                MediaType::Mp4,
                MediaType::QuickTime,
                MediaType::Avi,
                MediaType::Matroska,
                MediaType::WebM,
                MediaType::Flv,
            ],
            max_bytes: 500 * MIB,
            max_duration: None,
        }
    }

    pub fn allows(&self, media_type: MediaType) -> bool {
        self.allowed.contains(&media_type)
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Overrides from `policy.<profile>.max_bytes` and
    /// `policy.<profile>.max_duration_secs` (`0` or `none` lifts the cap).
    fn apply_config(mut self, profile: PolicyProfile, config: &ReelConfigSnapshot) -> Self {
        let prefix = format!("policy.{}", profile.as_str());
        if let Some(max_bytes) = config.get_u64(&format!("{prefix}.max_bytes")) {
            self.max_bytes = max_bytes;
        }
        match config.get(&format!("{prefix}.max_duration_secs")) {
            Some("0") | Some("none") => self.max_duration = None,
            Some(raw) => {
                if let Ok(secs) = raw.parse::<u64>() {
                    self.max_duration = Some(Duration::from_secs(secs));
                }
            }
            None => {}
        }
        self
    }
}

/// One policy per profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySet {
    short_form: IngestPolicy,
    unrestricted: IngestPolicy,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            short_form: IngestPolicy::short_form(),
            unrestricted: IngestPolicy::unrestricted(),
        }
    }
}

impl PolicySet {
    pub fn new(short_form: IngestPolicy, unrestricted: IngestPolicy) -> Self {
        Self {
            short_form,
            unrestricted,
        }
    }

    pub fn from_config(config: &ReelConfigSnapshot) -> Self {
        Self {
            short_form: IngestPolicy::short_form().apply_config(PolicyProfile::ShortForm, config),
            unrestricted: IngestPolicy::unrestricted()
                .apply_config(PolicyProfile::Unrestricted, config),
        }
    }

    pub fn get(&self, profile: PolicyProfile) -> &IngestPolicy {
        match profile {
            PolicyProfile::ShortForm => &self.short_form,
            PolicyProfile::Unrestricted => &self.unrestricted,
        }
    }

    /// Largest byte limit over all profiles.
    pub fn max_bytes(&self) -> u64 {
        self.short_form.max_bytes.max(self.unrestricted.max_bytes)
    }
}
