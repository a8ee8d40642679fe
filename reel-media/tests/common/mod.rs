#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::{stream, TryStreamExt};
use reel_blob::{BlobAdapter, BlobConfig, ByteStream, FsBlobStore};
use reel_media::{
    Catalog, Delivery, DeliveryService, IngestService, IngestValidator, MediaRepository,
    MemoryMediaRepository, Moderator, PolicySet, Spool, UploadRequest,
};
use tempfile::TempDir;

fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn identity_matrix() -> Vec<u8> {
    [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect()
}

/// A structurally valid MP4 with one video track of `duration_ms`, padded
/// with an `mdat` box to exactly `total_len` bytes.
pub fn mp4_clip(duration_ms: u32, total_len: usize) -> Vec<u8> {
    let mut ftyp = Vec::new();
    ftyp.extend_from_slice(b"isom");
    ftyp.extend_from_slice(&512u32.to_be_bytes());
    ftyp.extend_from_slice(b"isommp41");

    let mut mvhd = vec![0u8; 4];
    mvhd.extend_from_slice(&0u32.to_be_bytes());
    mvhd.extend_from_slice(&0u32.to_be_bytes());
    mvhd.extend_from_slice(&1000u32.to_be_bytes());
    mvhd.extend_from_slice(&duration_ms.to_be_bytes());
    mvhd.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd.extend_from_slice(&0x0100u16.to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 10]);
    mvhd.extend_from_slice(&identity_matrix());
    mvhd.extend_from_slice(&[0u8; 24]);
    mvhd.extend_from_slice(&2u32.to_be_bytes());
    assert_eq!(mvhd.len(), 100);

    let mut tkhd = vec![0, 0, 0, 3];
    tkhd.extend_from_slice(&0u32.to_be_bytes());
    tkhd.extend_from_slice(&0u32.to_be_bytes());
    tkhd.extend_from_slice(&1u32.to_be_bytes());
    tkhd.extend_from_slice(&0u32.to_be_bytes());
    tkhd.extend_from_slice(&duration_ms.to_be_bytes());
    tkhd.extend_from_slice(&[0u8; 8]);
    tkhd.extend_from_slice(&[0u8; 8]);
    tkhd.extend_from_slice(&identity_matrix());
    tkhd.extend_from_slice(&(320u32 << 16).to_be_bytes());
    tkhd.extend_from_slice(&(240u32 << 16).to_be_bytes());
    assert_eq!(tkhd.len(), 84);

    let mut mdhd = vec![0u8; 4];
    mdhd.extend_from_slice(&0u32.to_be_bytes());
    mdhd.extend_from_slice(&0u32.to_be_bytes());
    mdhd.extend_from_slice(&1000u32.to_be_bytes());
    mdhd.extend_from_slice(&duration_ms.to_be_bytes());
    mdhd.extend_from_slice(&0x55c4u16.to_be_bytes());
    mdhd.extend_from_slice(&0u16.to_be_bytes());
    assert_eq!(mdhd.len(), 24);

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(b"vide");
    hdlr.extend_from_slice(&[0u8; 12]);
    hdlr.push(0);
    assert_eq!(hdlr.len(), 25);

    let mdia = [mp4_box(b"mdhd", &mdhd), mp4_box(b"hdlr", &hdlr)].concat();
    let trak = [mp4_box(b"tkhd", &tkhd), mp4_box(b"mdia", &mdia)].concat();
    let moov = [mp4_box(b"mvhd", &mvhd), mp4_box(b"trak", &trak)].concat();

    let mut out = [mp4_box(b"ftyp", &ftyp), mp4_box(b"moov", &moov)].concat();
    assert!(total_len >= out.len() + 8, "clip too small for its headers");
    let pad: Vec<u8> = (0..total_len - out.len() - 8)
        .map(|i| (i % 251) as u8)
        .collect();
    out.extend_from_slice(&mp4_box(b"mdat", &pad));
    out
}

pub fn png_image(total_len: usize) -> Vec<u8> {
    let mut out = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    out.resize(total_len.max(out.len()), 0x42);
    out
}

pub fn body_of(data: &[u8]) -> ByteStream {
    let chunks: Vec<Result<Bytes, std::io::Error>> = data
        .chunks(64 * 1024)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Box::pin(stream::iter(chunks))
}

pub fn request(owner: &str, mime: &str) -> UploadRequest {
    UploadRequest {
        owner_ref: owner.to_string(),
        category_ref: "X".to_string(),
        title: "demo".to_string(),
        declared_mime: mime.to_string(),
        original_filename: Some("clip.bin".to_string()),
        ..UploadRequest::default()
    }
}

pub async fn read_body(delivery: Delivery) -> Vec<u8> {
    match delivery.body {
        Some(body) => {
            let chunks: Vec<Bytes> = body.try_collect().await.unwrap();
            chunks.concat()
        }
        None => Vec::new(),
    }
}

/// Every regular file under `root`, recursively.
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(files_under(&path));
        } else {
            found.push(path);
        }
    }
    found
}

pub struct Harness {
    pub dir: TempDir,
    pub records: Arc<MemoryMediaRepository>,
    pub ingest: IngestService,
    pub moderator: Moderator,
    pub delivery: DeliveryService,
    pub catalog: Catalog,
}

impl Harness {
    pub fn blob_root(&self) -> PathBuf {
        self.dir.path().join("blobs")
    }

    pub fn spool_root(&self) -> PathBuf {
        self.dir.path().join("spool")
    }
}

pub async fn harness(policies: PolicySet) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let config = BlobConfig::default().without_sync();
    let store = FsBlobStore::open(dir.path().join("blobs"), config.clone())
        .await
        .unwrap();
    let blobs = BlobAdapter::new(store, config);

    let records = Arc::new(MemoryMediaRepository::new());
    let shared: Arc<dyn MediaRepository> = records.clone();

    Harness {
        ingest: IngestService::new(
            blobs.clone(),
            shared.clone(),
            IngestValidator::new(policies),
            Spool::new(dir.path().join("spool")),
        ),
        moderator: Moderator::new(shared.clone()),
        delivery: DeliveryService::new(blobs, shared.clone()),
        catalog: Catalog::new(shared),
        records,
        dir,
    }
}
