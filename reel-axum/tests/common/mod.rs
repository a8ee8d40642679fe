#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use reel_axum::{ReelApp, ReelState};
use reel_blob::{BlobAdapter, BlobConfig, FsBlobStore};
use reel_media::{
    Catalog, DeliveryService, IngestPolicy, IngestService, IngestValidator, MediaRepository,
    MemoryMediaRepository, Moderator, PolicySet, Spool,
};
use serde_json::Value;
use tempfile::TempDir;

pub const BOUNDARY: &str = "reel-test-boundary";

fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32 + 8).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn be32(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// One-track MP4 of `duration_ms`, padded to `total_len` bytes.
pub fn mp4_clip(duration_ms: u32, total_len: usize) -> Vec<u8> {
    let matrix = be32(&[0x0001_0000, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000]);

    let ftyp = [b"isom".to_vec(), be32(&[512]), b"isommp41".to_vec()].concat();
    let mvhd = [
        be32(&[0, 0, 0, 1000, duration_ms, 0x0001_0000]),
        vec![0x01, 0x00],
        vec![0; 10],
        matrix.clone(),
        vec![0; 24],
        be32(&[2]),
    ]
    .concat();
    let tkhd = [
        be32(&[3, 0, 0, 1, 0, duration_ms]),
        vec![0; 16],
        matrix,
        be32(&[320 << 16, 240 << 16]),
    ]
    .concat();
    let mdhd = [be32(&[0, 0, 0, 1000, duration_ms]), vec![0x55, 0xc4, 0, 0]].concat();
    let hdlr = [be32(&[0, 0]), b"vide".to_vec(), vec![0; 13]].concat();
    assert_eq!((mvhd.len(), tkhd.len(), mdhd.len(), hdlr.len()), (100, 84, 24, 25));

    let mdia = [mp4_box(b"mdhd", &mdhd), mp4_box(b"hdlr", &hdlr)].concat();
    let trak = [mp4_box(b"tkhd", &tkhd), mp4_box(b"mdia", &mdia)].concat();
    let moov = [mp4_box(b"mvhd", &mvhd), mp4_box(b"trak", &trak)].concat();
    let mut out = [mp4_box(b"ftyp", &ftyp), mp4_box(b"moov", &moov)].concat();

    let pad: Vec<u8> = (0..total_len - out.len() - 8).map(|i| (i % 251) as u8).collect();
    out.extend_from_slice(&mp4_box(b"mdat", &pad));
    out
}

pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, mime: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.mp4\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Body {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(self.body)
    }
}

pub fn clip_form(mime: &str, data: &[u8]) -> Body {
    Form::new()
        .text("title", "demo")
        .text("category", "X")
        .file(mime, data)
        .finish()
}

pub fn upload(path: &str, actor: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(actor) = actor {
        builder = builder.header("x-actor-id", actor);
    }
    builder.body(body).unwrap()
}

pub fn get(path: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(path)
}

pub fn moderate(id: &str, event: &str, actor: Option<(&str, &str)>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PUT")
        .uri(format!("/media/{id}/moderation"))
        .header("content-type", "application/json");
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    builder
        .body(Body::from(format!("{{\"event\":\"{event}\"}}")))
        .unwrap()
}

pub async fn json_body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn raw_body(res: Response) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub struct TestApp {
    pub dir: TempDir,
    pub router: Router,
}

pub async fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = BlobConfig::default().without_sync();
    let store = FsBlobStore::open(dir.path().join("blobs"), config.clone())
        .await
        .unwrap();
    let blobs = BlobAdapter::new(store, config);
    let records: Arc<dyn MediaRepository> = Arc::new(MemoryMediaRepository::new());
    let policies = PolicySet::new(
        IngestPolicy::short_form().with_max_bytes(64 * 1024),
        IngestPolicy::unrestricted(),
    );

    let state = ReelState::new(
        IngestService::new(
            blobs.clone(),
            records.clone(),
            IngestValidator::new(policies),
            Spool::new(dir.path().join("spool")),
        ),
        Moderator::new(records.clone()),
        DeliveryService::new(blobs, records.clone()),
        Catalog::new(records),
    );

    TestApp {
        router: ReelApp::new(state).into_router(),
        dir,
    }
}
