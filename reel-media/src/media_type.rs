//! Media types the platform knows how to accept.

use std::fmt;

/// Container families. A declared type and the sniffed type must share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    IsoBmff,
    Ebml,
    Riff,
    Flv,
    Jpeg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Mp4,
    QuickTime,
    WebM,
    Matroska,
    Avi,
    Flv,
    Jpeg,
    Png,
}

impl MediaType {
    /// Canonical MIME type, as stored on records and sent on delivery.
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Mp4 => "video/mp4",
            MediaType::QuickTime => "video/quicktime",
            MediaType::WebM => "video/webm",
            MediaType::Matroska => "video/x-matroska",
            MediaType::Avi => "video/x-msvideo",
            MediaType::Flv => "video/x-flv",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Mp4 => "mp4",
            MediaType::QuickTime => "mov",
            MediaType::WebM => "webm",
            MediaType::Matroska => "mkv",
            MediaType::Avi => "avi",
            MediaType::Flv => "flv",
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
        }
    }

    pub fn container(&self) -> Container {
        match self {
            MediaType::Mp4 | MediaType::QuickTime => Container::IsoBmff,
            MediaType::WebM | MediaType::Matroska => Container::Ebml,
            MediaType::Avi => Container::Riff,
            MediaType::Flv => Container::Flv,
            MediaType::Jpeg => Container::Jpeg,
            MediaType::Png => Container::Png,
        }
    }

    pub fn is_video(&self) -> bool {
        !matches!(self, MediaType::Jpeg | MediaType::Png)
    }

    /// Parses a declared MIME type. Parameters are dropped, case is ignored,
    /// and the non-standard names browsers and older clients send
    /// (`video/mov`, `video/avi`, `video/mkv`, `video/flv`, `image/jpg`) are
    /// accepted as aliases.
    pub fn from_mime(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        let media = match essence.as_str() {
            "video/mp4" => MediaType::Mp4,
            "video/quicktime" | "video/mov" => MediaType::QuickTime,
            "video/webm" => MediaType::WebM,
            "video/x-matroska" | "video/mkv" => MediaType::Matroska,
            "video/x-msvideo" | "video/avi" | "video/msvideo" => MediaType::Avi,
            "video/x-flv" | "video/flv" => MediaType::Flv,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => MediaType::Jpeg,
            "image/png" => MediaType::Png,
            _ => return None,
        };
        Some(media)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let media = match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => MediaType::Mp4,
            "mov" => MediaType::QuickTime,
            "webm" => MediaType::WebM,
            "mkv" => MediaType::Matroska,
            "avi" => MediaType::Avi,
            "flv" => MediaType::Flv,
            "jpg" | "jpeg" => MediaType::Jpeg,
            "png" => MediaType::Png,
            _ => return None,
        };
        Some(media)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
