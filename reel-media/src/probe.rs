//! Content inspection: what the bytes actually are, and how long a video
//! runs. Nothing here trusts the client's declared type or filename.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::{MediaError, MediaResult, MediaType};

/// Bytes read from the start of a file for sniffing.
pub const SNIFF_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse container: {0}")]
    ContainerParse(String),

    #[error("Container has no duration")]
    NoDuration,
}

/// Result of inspecting a spooled upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inspection {
    pub sniffed: Option<MediaType>,
    pub duration_secs: Option<f64>,
}

/// Identifies a media type from its leading bytes.
pub fn sniff(head: &[u8]) -> Option<MediaType> {
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(MediaType::Jpeg);
    }
    if head.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(MediaType::Png);
    }
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        // EBML header; the DocType tells WebM apart from generic Matroska.
        let is_webm = head.windows(4).any(|w| w == b"webm");
        return Some(if is_webm { MediaType::WebM } else { MediaType::Matroska });
    }
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"AVI " {
        return Some(MediaType::Avi);
    }
    if head.len() >= 4 && &head[0..3] == b"FLV" && head[3] == 0x01 {
        return Some(MediaType::Flv);
    }
    if head.len() >= 8 {
        match &head[4..8] {
            b"ftyp" => {
                let brand = head.get(8..12).unwrap_or_default();
                return Some(if brand == b"qt  " {
                    MediaType::QuickTime
                } else {
                    MediaType::Mp4
                });
            }
            b"moov" | b"mdat" | b"wide" | b"free" => return Some(MediaType::Mp4),
            _ => {}
        }
    }
    None
}

fn mp4_duration(path: &Path) -> Result<f64, ProbeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let context = mp4parse::read_mp4(&mut reader)
        .map_err(|e| ProbeError::ContainerParse(format!("MP4 parse error: {:?}", e)))?;

    let movie_scale = context.timescale.as_ref().map(|ts| ts.0);
    context
        .tracks
        .iter()
        .filter_map(|track| {
            let duration = track.duration.as_ref()?.0;
            let scale = track.timescale.as_ref().map(|s| s.0).or(movie_scale)?;
            (scale > 0 && duration != u64::MAX).then(|| duration as f64 / scale as f64)
        })
        .fold(None, |longest: Option<f64>, secs| {
            Some(longest.map_or(secs, |l| l.max(secs)))
        })
        .ok_or(ProbeError::NoDuration)
}

fn matroska_duration(path: &Path) -> Result<f64, ProbeError> {
    let reader = BufReader::new(File::open(path)?);
    let mkv = matroska::Matroska::open(reader)
        .map_err(|e| ProbeError::ContainerParse(format!("MKV parse error: {}", e)))?;
    mkv.info
        .duration
        .map(|d| d.as_secs_f64())
        .ok_or(ProbeError::NoDuration)
}

/// Playback duration in seconds for containers we can decode.
///
/// `Ok(None)` for types without a duration probe (images, AVI, FLV).
pub fn probe_duration(path: &Path, media_type: MediaType) -> Result<Option<f64>, ProbeError> {
    match media_type {
        MediaType::Mp4 | MediaType::QuickTime => mp4_duration(path).map(Some),
        MediaType::WebM | MediaType::Matroska => matroska_duration(path).map(Some),
        MediaType::Avi | MediaType::Flv | MediaType::Jpeg | MediaType::Png => Ok(None),
    }
}

/// Blocking inspection of a file on disk.
pub fn inspect_file(path: &Path) -> Result<Inspection, std::io::Error> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;

    let sniffed = sniff(&head);
    let duration_secs = match sniffed {
        Some(media_type) if media_type.is_video() => match probe_duration(path, media_type) {
            Ok(secs) => secs,
            Err(ProbeError::Io(e)) => return Err(e),
            Err(e) => {
                tracing::debug!(error = %e, %media_type, "duration probe failed");
                None
            }
        },
        _ => None,
    };

    Ok(Inspection {
        sniffed,
        duration_secs,
    })
}

/// Runs [`inspect_file`] on the blocking pool.
pub async fn inspect(path: PathBuf) -> MediaResult<Inspection> {
    tokio::task::spawn_blocking(move || inspect_file(&path))
        .await
        .map_err(MediaError::storage)?
        .map_err(MediaError::from)
}
