//! Wires configuration into stores, services and the HTTP app.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use reel_axum::{ReelApp, ReelState};
use reel_blob::{BlobAdapter, BlobConfig, FsBlobStore};
use reel_core::{ReelConfig, ReelConfigSnapshot};
use reel_media::{
    Catalog, DeliveryService, FsMediaRepository, IngestService, IngestValidator, MediaRepository,
    MemoryMediaRepository, Moderator, PolicySet, Spool,
};

pub const ENV_PREFIX: &str = "REEL__";

pub fn apply_defaults(config: &mut ReelConfig) {
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3030");
    config.set_default("storage.root", "./data/blobs");
    config.set_default("records.root", "./data/records");
    config.set_default("delivery.chunk_bytes", "8192");
    config.set_default("policy.short_form.max_bytes", "26214400");
    config.set_default("policy.short_form.max_duration_secs", "60");
    config.set_default("policy.unrestricted.max_bytes", "524288000");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub storage_root: PathBuf,
    /// `None` keeps records in memory.
    pub records_root: Option<PathBuf>,
    pub spool_dir: Option<PathBuf>,
    pub chunk_bytes: usize,
}

impl ServerSettings {
    pub fn from_config(config: &ReelConfigSnapshot) -> Result<Self> {
        let port = match config.get("http.port") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("http.port must be a port number, got {raw:?}"))?,
            None => 3030,
        };
        Ok(Self {
            host: config
                .get_string("http.host")
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            storage_root: config
                .get("storage.root")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/blobs")),
            records_root: config.get("records.root").map(PathBuf::from),
            spool_dir: config.get("spool.dir").map(PathBuf::from),
            chunk_bytes: config.get_usize("delivery.chunk_bytes").unwrap_or(8192),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct Server {
    pub settings: ServerSettings,
    pub app: ReelApp,
}

pub async fn build(config: &ReelConfig) -> Result<Server> {
    let snapshot = config.snapshot();
    let settings = ServerSettings::from_config(&snapshot)?;
    let policies = PolicySet::from_config(&snapshot);

    let blob_config = BlobConfig::default()
        .with_max_blob_bytes(policies.max_bytes())
        .with_read_chunk_bytes(settings.chunk_bytes);
    let store = FsBlobStore::open(&settings.storage_root, blob_config.clone()).await?;
    let blobs = BlobAdapter::new(store, blob_config);

    let records: Arc<dyn MediaRepository> = match &settings.records_root {
        Some(root) => Arc::new(FsMediaRepository::open(root).await?),
        None => {
            tracing::warn!("records.root is empty, media records will not survive a restart");
            Arc::new(MemoryMediaRepository::new())
        }
    };

    let spool = settings
        .spool_dir
        .as_ref()
        .map(Spool::new)
        .unwrap_or_else(Spool::system);

    tracing::info!(
        storage_root = %settings.storage_root.display(),
        spool = %spool.dir().display(),
        short_form_max_bytes = policies.get(reel_media::PolicyProfile::ShortForm).max_bytes,
        "reel configured"
    );

    let state = ReelState::new(
        IngestService::new(
            blobs.clone(),
            records.clone(),
            IngestValidator::new(policies),
            spool,
        ),
        Moderator::new(records.clone()),
        DeliveryService::new(blobs, records.clone()),
        Catalog::new(records),
    );

    Ok(Server {
        settings,
        app: ReelApp::new(state),
    })
}
