//! # reel-media
//!
//! Media ingest, moderation and delivery on top of `reel-blob`.
//!
//! An upload is spooled to a temp file, inspected (content sniffing and
//! duration probing), checked against a named [`IngestPolicy`], and only
//! then committed to the blob store with a `pending` [`MediaRecord`].
//! Moderators move records to `published` or `rejected` through a
//! compare-and-set on the repository. Delivery streams blobs back, whole or
//! by byte range, honouring moderation visibility.

mod catalog;
mod delivery;
mod error;
mod fs_repository;
mod ingest;
mod media_type;
mod moderation;
mod policy;
pub mod probe;
mod record;
mod repository;
mod spool;
mod validator;

pub use catalog::Catalog;
pub use delivery::{can_view, display_filename, Delivery, DeliveryService, DeliveryStatus};
pub use error::{MediaError, MediaResult, ValidationError};
pub use fs_repository::FsMediaRepository;
pub use ingest::IngestService;
pub use media_type::{Container, MediaType};
pub use moderation::{ModerationEvent, Moderator};
pub use policy::{IngestPolicy, PolicyProfile, PolicySet};
pub use probe::{Inspection, ProbeError};
pub use record::{
    MediaId, MediaRecord, MediaStatus, RecordFilter, UploadRequest, MAX_DESCRIPTION_CHARS,
    MAX_REF_CHARS, MAX_TITLE_CHARS,
};
pub use repository::{MediaRepository, MemoryMediaRepository};
pub use spool::{Spool, SpoolWriter, SpooledUpload};
pub use validator::{IngestValidator, UploadFacts};
