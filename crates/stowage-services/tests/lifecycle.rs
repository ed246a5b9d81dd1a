//! Full lifecycle of one upload: pending entry, client upload, claim with
//! immediate resize, then both sweeps against the claimed object.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde_json::json;
use stowage_core::{naming, NewClaimedFile, UsageRegistry};
use stowage_db::{ClaimedFileStore, PendingUploadStore};
use stowage_services::test_helpers::{
    recording_bucket_set, test_container, MemoryClaimedStore, MemoryPendingStore, RecordingStore,
    TestImageUsage,
};
use stowage_services::{ClaimService, CleanupService, ResizeService};
use tempfile::tempdir;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 90, 30, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

struct Harness {
    pending: MemoryPendingStore,
    claimed: MemoryClaimedStore,
    store: RecordingStore,
    claim: ClaimService,
    cleanup: CleanupService,
    _scratch: tempfile::TempDir,
}

fn harness() -> Harness {
    let scratch = tempdir().unwrap();
    let pending = MemoryPendingStore::new();
    let claimed = MemoryClaimedStore::new();
    let store = RecordingStore::new();
    let buckets = Arc::new(recording_bucket_set(
        test_container("bucket-a"),
        store.clone(),
        scratch.path(),
    ));

    let mut registry = UsageRegistry::new();
    registry.register_image(Arc::new(TestImageUsage::new(
        "image",
        test_container("bucket-a"),
    )));
    let registry = Arc::new(registry);

    let resize = ResizeService::new(Arc::new(claimed.clone()), buckets.clone(), registry.clone());
    let claim = ClaimService::new(Arc::new(claimed.clone()), registry.clone(), resize);
    let cleanup = CleanupService::new(
        Arc::new(pending.clone()),
        Arc::new(claimed.clone()),
        buckets,
        registry,
    );

    Harness {
        pending,
        claimed,
        store,
        claim,
        cleanup,
        _scratch: scratch,
    }
}

/// Wait for the spawned resize task to stamp the record.
async fn wait_for_processed(claimed: &MemoryClaimedStore, id: uuid::Uuid) {
    for _ in 0..100 {
        if claimed.record(id).map(|r| r.is_processed()) == Some(true) {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!("resize task never stamped record {id}");
}

#[tokio::test]
async fn test_claimed_upload_survives_both_sweeps_normalized() {
    let h = harness();
    let file_name = naming::random_file_name("png");

    // Issue the upload slot, then stand in for the client's PUT.
    let entry = h
        .pending
        .record_pending(&file_name, "bucket-a")
        .await
        .unwrap();
    assert_eq!(entry.container_name, "bucket-a");
    h.store.set_object(&file_name, png_bytes(1600, 3200));

    // Claiming an image kind kicks off the resize in the background.
    let record = h
        .claim
        .claim(NewClaimedFile {
            file_name: file_name.clone(),
            kind: "image".to_string(),
            retain_until: None,
            payload: json!({}),
        })
        .await
        .unwrap();
    wait_for_processed(&h.claimed, record.id).await;

    // Past the grace window the pending entry resolves as claimed: the
    // entry goes, the object and the claim record stay.
    let later = Utc::now() + Duration::hours(25);
    let resolved = h.cleanup.sweep_never_claimed(later).await.unwrap();
    assert_eq!(resolved, 1);
    assert!(h.pending.is_empty());
    assert!(h.store.has_object(&file_name));
    assert!(h.claimed.record(record.id).is_some());

    // Open-ended retention is never up for the retention sweep.
    let outcome = h.cleanup.sweep_expired(later, None).await.unwrap();
    assert_eq!(outcome.deleted, 0);
    assert_eq!(outcome.rescheduled, 0);

    // The stored object is now the bounded JPEG rendition.
    let stored = h.store.object(&file_name).unwrap();
    assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);
    let img = image::ImageReader::new(Cursor::new(stored.as_slice()))
        .with_guessed_format()
        .unwrap()
        .decode()
        .unwrap();
    assert_eq!(img.dimensions(), (400, 800));
}

#[tokio::test]
async fn test_abandoned_upload_is_fully_reclaimed() {
    let h = harness();
    let file_name = naming::random_file_name("png");

    h.pending
        .record_pending(&file_name, "bucket-a")
        .await
        .unwrap();
    h.store.set_object(&file_name, png_bytes(64, 64));

    // No claim ever arrives. Past the grace window both the object and
    // the entry are reclaimed.
    let resolved = h
        .cleanup
        .sweep_never_claimed(Utc::now() + Duration::hours(25))
        .await
        .unwrap();

    assert_eq!(resolved, 1);
    assert!(!h.store.has_object(&file_name));
    assert!(h.pending.is_empty());
    assert!(h.claimed.is_empty());
}

#[tokio::test]
async fn test_expired_claim_is_deleted_with_reason() {
    let scratch = tempdir().unwrap();
    let pending = MemoryPendingStore::new();
    let claimed = MemoryClaimedStore::new();
    let store = RecordingStore::new();
    let buckets = Arc::new(recording_bucket_set(
        test_container("bucket-a"),
        store.clone(),
        scratch.path(),
    ));

    let mut registry = UsageRegistry::new();
    registry.register_image(Arc::new(
        TestImageUsage::new("image", test_container("bucket-a")).with_reason("claim released"),
    ));

    let cleanup = CleanupService::new(
        Arc::new(pending),
        Arc::new(claimed.clone()),
        buckets,
        Arc::new(registry),
    );

    let file_name = naming::random_file_name("png");
    store.set_object(&file_name, png_bytes(64, 64));
    let record = claimed
        .insert(NewClaimedFile {
            file_name: file_name.clone(),
            kind: "image".to_string(),
            retain_until: Some(Utc::now() - Duration::hours(1)),
            payload: json!({}),
        })
        .await
        .unwrap();

    let outcome = cleanup.sweep_expired(Utc::now(), None).await.unwrap();

    assert_eq!(outcome.deleted, 1);
    assert!(!store.has_object(&file_name));
    assert!(claimed.record(record.id).is_none());
}
