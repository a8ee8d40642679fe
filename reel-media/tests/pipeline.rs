mod common;

use common::*;
use reel_blob::StorageKey;
use reel_core::ActorContext;
use reel_media::{
    DeliveryStatus, IngestPolicy, MediaError, MediaStatus, ModerationEvent, PolicyProfile,
    PolicySet, RecordFilter, ValidationError,
};

const MB: usize = 1_000_000;

fn small_limits() -> PolicySet {
    PolicySet::new(
        IngestPolicy::short_form().with_max_bytes(64 * 1024),
        IngestPolicy::unrestricted().with_max_bytes(256 * 1024),
    )
}

#[tokio::test]
async fn clip_is_ingested_moderated_and_served_by_range() {
    let h = harness(PolicySet::default()).await;
    let clip = mp4_clip(45_000, 10 * MB);

    let record = h
        .ingest
        .ingest(PolicyProfile::ShortForm, request("alice", "video/mp4"), body_of(&clip))
        .await
        .unwrap();
    assert_eq!(record.status, MediaStatus::Pending);
    assert_eq!(record.mime_type, "video/mp4");
    assert_eq!(record.size_bytes, clip.len() as u64);
    assert_eq!(record.category_ref, "X");
    assert!((record.duration_seconds.unwrap() - 45.0).abs() < 1e-6);
    assert_eq!(record.storage_key.extension(), Some("mp4"));

    let status = h
        .moderator
        .transition(&record.id, ModerationEvent::Approve)
        .await
        .unwrap();
    assert_eq!(status, MediaStatus::Published);

    let viewer = ActorContext::anonymous();
    let partial = h
        .delivery
        .serve_record(&record.id, &viewer, Some("bytes=0-1023"))
        .await
        .unwrap();
    assert_eq!(partial.status, DeliveryStatus::Partial);
    assert_eq!(partial.content_length(), 1024);
    assert_eq!(
        partial.content_range().unwrap(),
        format!("bytes 0-1023/{}", clip.len())
    );
    assert_eq!(read_body(partial).await, &clip[..1024]);

    let full = h.delivery.serve(&record.storage_key, None).await.unwrap();
    assert_eq!(full.status, DeliveryStatus::Full);
    assert_eq!(full.content_type, "video/mp4");
    assert_eq!(read_body(full).await, clip);

    assert!(files_under(&h.spool_root()).is_empty());
}

#[tokio::test]
async fn oversized_upload_leaves_nothing_behind() {
    let h = harness(small_limits()).await;
    let clip = mp4_clip(10_000, 100 * 1024);

    let err = h
        .ingest
        .ingest(PolicyProfile::ShortForm, request("alice", "video/mp4"), body_of(&clip))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MediaError::Validation(ValidationError::TooLarge { max_bytes: 65536, .. })
    ));
    assert!(h.records.is_empty());
    assert!(files_under(&h.blob_root()).is_empty());
    assert!(files_under(&h.spool_root()).is_empty());
}

#[tokio::test]
async fn long_clip_is_refused() {
    let h = harness(small_limits()).await;
    let clip = mp4_clip(61_000, 4096);

    let err = h
        .ingest
        .ingest(PolicyProfile::ShortForm, request("alice", "video/mp4"), body_of(&clip))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MediaError::Validation(ValidationError::TooLong { max_secs: 60, .. })
    ));
    assert!(h.records.is_empty());
    assert!(files_under(&h.blob_root()).is_empty());
}

#[tokio::test]
async fn long_video_is_fine_on_the_unrestricted_path() {
    let h = harness(small_limits()).await;
    let clip = mp4_clip(3_600_000, 4096);

    let record = h
        .ingest
        .ingest(PolicyProfile::Unrestricted, request("alice", "video/mp4"), body_of(&clip))
        .await
        .unwrap();
    assert!((record.duration_seconds.unwrap() - 3600.0).abs() < 1e-6);
}

#[tokio::test]
async fn declared_type_must_be_allowed_and_match_the_bytes() {
    let h = harness(small_limits()).await;

    let err = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/webm"),
            body_of(&mp4_clip(1_000, 2048)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaError::Validation(ValidationError::UnsupportedType { .. })
    ));

    // Claims to be a video, is actually a PNG.
    let err = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/mp4"),
            body_of(&png_image(2048)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaError::Validation(ValidationError::UnsupportedType { .. })
    ));
    assert!(files_under(&h.blob_root()).is_empty());
}

#[tokio::test]
async fn oversized_body_with_the_wrong_bytes_is_a_type_failure() {
    let h = harness(small_limits()).await;

    let err = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/mp4"),
            body_of(&png_image(100 * 1024)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaError::Validation(ValidationError::UnsupportedType { .. })
    ));
    assert!(h.records.is_empty());
    assert!(files_under(&h.spool_root()).is_empty());
}

#[tokio::test]
async fn image_clips_are_stored_by_sniffed_type() {
    let h = harness(small_limits()).await;
    let record = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "image/jpg"),
            body_of(&png_image(2048)),
        )
        .await;
    // JPEG declared, PNG bytes: same family is required, so this is refused.
    assert!(record.is_err());

    let record = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "image/png"),
            body_of(&png_image(2048)),
        )
        .await
        .unwrap();
    assert_eq!(record.mime_type, "image/png");
    assert_eq!(record.duration_seconds, None);
}

#[tokio::test]
async fn missing_metadata_is_reported_per_field() {
    let h = harness(small_limits()).await;
    let mut req = request("alice", "video/mp4");
    req.title = "   ".into();
    req.category_ref.clear();

    let err = h
        .ingest
        .ingest(PolicyProfile::ShortForm, req, body_of(&mp4_clip(1_000, 2048)))
        .await
        .unwrap_err();
    match err {
        MediaError::Invalid { errors, .. } => {
            assert!(errors.contains_key("title"));
            assert!(errors.contains_key("category"));
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_moderators_yield_exactly_one_winner() {
    let h = harness(small_limits()).await;
    let record = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/mp4"),
            body_of(&mp4_clip(5_000, 4096)),
        )
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let moderator = h.moderator.clone();
        let id = record.id.clone();
        let event = if i % 2 == 0 {
            ModerationEvent::Approve
        } else {
            ModerationEvent::Reject
        };
        tasks.push(tokio::spawn(async move {
            moderator.transition(&id, event).await
        }));
    }

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(MediaError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn terminal_states_refuse_every_event() {
    let h = harness(small_limits()).await;
    let record = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/mp4"),
            body_of(&mp4_clip(5_000, 4096)),
        )
        .await
        .unwrap();
    h.moderator
        .transition(&record.id, ModerationEvent::Approve)
        .await
        .unwrap();

    for event in [
        ModerationEvent::Approve,
        ModerationEvent::Approve,
        ModerationEvent::Reject,
    ] {
        let err = h.moderator.transition(&record.id, event).await.unwrap_err();
        assert!(matches!(
            err,
            MediaError::Conflict { status: MediaStatus::Published, .. }
        ));
    }
}

#[tokio::test]
async fn range_past_the_end_is_unsatisfiable() {
    let h = harness(small_limits()).await;
    let record = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/mp4"),
            body_of(&mp4_clip(5_000, 4096)),
        )
        .await
        .unwrap();

    let d = h
        .delivery
        .serve(&record.storage_key, Some("bytes=4096-"))
        .await
        .unwrap();
    assert_eq!(d.status, DeliveryStatus::RangeNotSatisfiable);
    assert_eq!(d.content_range().unwrap(), "bytes */4096");
    assert!(d.body.is_none());

    let d = h
        .delivery
        .serve(&record.storage_key, Some("bytes=0-99"))
        .await
        .unwrap();
    assert_eq!(d.status, DeliveryStatus::Partial);
    assert_eq!(read_body(d).await.len(), 100);

    // Malformed headers fall back to the whole blob.
    let d = h
        .delivery
        .serve(&record.storage_key, Some("bytes=oops"))
        .await
        .unwrap();
    assert_eq!(d.status, DeliveryStatus::Full);
    assert_eq!(d.content_length(), 4096);
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let h = harness(small_limits()).await;
    let key = StorageKey::parse("2026/01/nothing.mp4").unwrap();
    let err = h.delivery.serve(&key, None).await.unwrap_err();
    assert!(matches!(err, MediaError::NotFound { .. }));
}

#[tokio::test]
async fn unpublished_media_is_hidden_from_strangers() {
    let h = harness(small_limits()).await;
    let record = h
        .ingest
        .ingest(
            PolicyProfile::ShortForm,
            request("alice", "video/mp4"),
            body_of(&mp4_clip(5_000, 4096)),
        )
        .await
        .unwrap();

    let stranger = ActorContext::user("bob");
    let err = h
        .delivery
        .serve_key_for(&record.storage_key, &stranger, None)
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::NotFound { .. }));
    assert!(h.catalog.get_for(&record.id, &stranger).await.is_err());

    let owner = ActorContext::user("alice");
    assert!(h.delivery.serve_record(&record.id, &owner, None).await.is_ok());

    h.moderator
        .transition(&record.id, ModerationEvent::Reject)
        .await
        .unwrap();
    assert!(h.catalog.get_for(&record.id, &owner).await.is_err());
    assert!(h
        .catalog
        .get_for(&record.id, &ActorContext::admin("mod"))
        .await
        .is_ok());
}

#[tokio::test]
async fn listing_is_scoped_to_the_actor() {
    let h = harness(small_limits()).await;
    let mut ids = Vec::new();
    for owner in ["alice", "alice", "bob"] {
        let record = h
            .ingest
            .ingest(
                PolicyProfile::ShortForm,
                request(owner, "video/mp4"),
                body_of(&mp4_clip(5_000, 4096)),
            )
            .await
            .unwrap();
        ids.push(record.id);
    }
    h.moderator
        .transition(&ids[0], ModerationEvent::Approve)
        .await
        .unwrap();

    let admin = ActorContext::admin("mod");
    let queue = h.moderator.pending(None).await.unwrap();
    assert_eq!(queue.len(), 2);
    assert!(queue.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let everything = h.catalog.list_for(&admin, RecordFilter::default()).await.unwrap();
    assert_eq!(everything.len(), 3);

    let bob = ActorContext::user("bob");
    let public = h.catalog.list_for(&bob, RecordFilter::default()).await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].id, ids[0]);

    let err = h
        .catalog
        .list_for(&bob, RecordFilter::with_status(MediaStatus::Pending))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Forbidden { .. }));

    let own_pending = RecordFilter {
        owner_ref: Some("bob".into()),
        ..RecordFilter::with_status(MediaStatus::Pending)
    };
    let mine = h.catalog.list_for(&bob, own_pending).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, ids[2]);
}
