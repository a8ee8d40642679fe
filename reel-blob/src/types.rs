use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::{BlobError, BlobResult, ResolvedRange};

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

const MAX_KEY_LEN: usize = 256;

/// Opaque, store-relative address of a blob.
///
/// Keys are produced by a [`crate::BlobKeyStrategy`], never from client
/// filenames. Parsing rejects anything that could escape the store root or
/// reach staging files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageKey(String);

impl StorageKey {
    pub fn parse<S: Into<String>>(raw: S) -> BlobResult<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > MAX_KEY_LEN {
            return Err(BlobError::invalid("storage key length out of bounds"));
        }
        if raw.starts_with('/') {
            return Err(BlobError::invalid("storage key must be relative"));
        }
        let charset_ok = raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'/'));
        if !charset_ok {
            return Err(BlobError::invalid("storage key contains forbidden characters"));
        }
        for segment in raw.split('/') {
            if segment.is_empty() || segment.starts_with('.') {
                return Err(BlobError::invalid("storage key has an empty or hidden segment"));
            }
        }
        Ok(Self(raw))
    }

    /// For keys built from a date and a uuid, which always parse.
    pub(crate) fn from_generated(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension of the final segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let file = self.0.rsplit('/').next()?;
        file.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl TryFrom<String> for StorageKey {
    type Error = BlobError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps `[a-z0-9]{1,8}` extensions, drops anything else.
pub fn sanitize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
    let ok = !ext.is_empty()
        && ext.len() <= 8
        && ext.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    ok.then_some(ext)
}

/// Request to store a blob
#[derive(Debug, Clone, Default)]
pub struct BlobPut {
    pub content_type: Option<String>,
    pub extension: Option<String>,
    pub size_hint: Option<u64>,
}

impl BlobPut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declared extension; unsafe values are silently dropped.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = sanitize_extension(ext);
        self
    }

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }
}

/// A single byte range as requested by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `start-end` or `start-` (end inclusive, `None` means to end of blob)
    Bounded { start: u64, end: Option<u64> },
    /// `-len`: the last `len` bytes
    Suffix { len: u64 },
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self::Bounded { start, end }
    }

    pub fn from_start(start: u64) -> Self {
        Self::Bounded { start, end: None }
    }

    pub fn suffix(len: u64) -> Self {
        Self::Suffix { len }
    }

    /// Parses an HTTP `Range` header value.
    ///
    /// Returns `None` for anything that is not a single well-formed
    /// `bytes=` range; callers treat that as "no range".
    pub fn parse_header(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }
        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());

        match (start.is_empty(), end.is_empty()) {
            (true, false) => Some(Self::suffix(end.parse().ok()?)),
            (false, true) => Some(Self::from_start(start.parse().ok()?)),
            (false, false) => {
                let start: u64 = start.parse().ok()?;
                let end: u64 = end.parse().ok()?;
                (end >= start).then_some(Self::new(start, Some(end)))
            }
            (true, true) => None,
        }
    }

    /// Resolves against the blob's total size.
    ///
    /// `end` is clamped to the last byte. A start at or past the end, an
    /// empty suffix, or an empty blob is unsatisfiable.
    pub fn resolve(&self, total_size: u64) -> BlobResult<ResolvedRange> {
        let unsatisfiable = BlobError::RangeNotSatisfiable { total_size };
        if total_size == 0 {
            return Err(unsatisfiable);
        }
        let last = total_size - 1;
        let (start, end) = match *self {
            ByteRange::Bounded { start, end } => {
                if start > last {
                    return Err(unsatisfiable);
                }
                (start, end.map_or(last, |e| e.min(last)))
            }
            ByteRange::Suffix { len } => {
                if len == 0 {
                    return Err(unsatisfiable);
                }
                (total_size.saturating_sub(len), last)
            }
        };
        Ok(ResolvedRange {
            start,
            end,
            total_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_header_forms() {
        assert_eq!(ByteRange::parse_header("bytes=0-99"), Some(ByteRange::new(0, Some(99))));
        assert_eq!(ByteRange::parse_header("bytes=500-"), Some(ByteRange::from_start(500)));
        assert_eq!(ByteRange::parse_header("bytes=-20"), Some(ByteRange::suffix(20)));
    }

    #[test]
    fn malformed_headers_are_ignored() {
        for raw in ["items=0-1", "bytes=5-2", "bytes=-", "bytes=0-1,4-5", "bytes=a-b", "bytes"] {
            assert_eq!(ByteRange::parse_header(raw), None, "{raw}");
        }
    }

    #[test]
    fn resolve_clamps_end_and_rejects_far_start() {
        let r = ByteRange::new(10, Some(5_000)).resolve(100).unwrap();
        assert_eq!((r.start, r.end, r.content_length()), (10, 99, 90));

        let err = ByteRange::from_start(100).resolve(100).unwrap_err();
        assert!(matches!(err, BlobError::RangeNotSatisfiable { total_size: 100 }));
    }

    #[test]
    fn suffix_longer_than_blob_is_whole_blob() {
        let r = ByteRange::suffix(1_000).resolve(10).unwrap();
        assert_eq!((r.start, r.end), (0, 9));
        assert!(ByteRange::suffix(0).resolve(10).is_err());
    }

    #[test]
    fn storage_keys_refuse_traversal() {
        assert!(StorageKey::parse("2026/10/abc.mp4").is_ok());
        for bad in ["", "/etc/passwd", "../x", "a//b", "a/../b", ".staging/x.part", "a\\b", "a b"] {
            assert!(StorageKey::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn extension_sanitising() {
        assert_eq!(sanitize_extension(".MP4").as_deref(), Some("mp4"));
        assert_eq!(sanitize_extension("php/../x"), None);
        assert_eq!(sanitize_extension("toolongext"), None);
        assert_eq!(StorageKey::parse("2026/10/abc.webm").unwrap().extension(), Some("webm"));
    }
}
