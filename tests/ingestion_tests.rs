//! Event ingestion tests
//!
//! Uses temporary SQLite databases as both the event sink and the ad directory.

use std::sync::Arc;

use adtrack::analytics::{AdDirectory, EngagementEvent, EventKind, EventSink, TrackEventPayload};
use adtrack::config::TrackingConfig;
use adtrack::errors::AdTrackError;
use adtrack::services::IngestionService;
use adtrack::storage::{Advertisement, EventFilter, NewAdvertisement, Placement, SeaOrmStorage};
use chrono::{Duration, Utc};
use tempfile::TempDir;

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("events.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

fn tracking(dedup_window_secs: u64) -> TrackingConfig {
    TrackingConfig {
        dedup_window_secs,
        dedup_capacity: 1_000,
        max_page_length: 64,
        impression_ratio: 0.01,
        view_ratio: 0.5,
        view_threshold_ms: 1000,
    }
}

async fn seeded(dedup_window_secs: u64) -> (IngestionService, Arc<SeaOrmStorage>, TempDir) {
    let (storage, dir) = create_temp_storage().await;
    storage
        .create_ad(
            NewAdvertisement::new("ad-1", "Spring Issue", Placement::Sidebar)
                .with_urls("https://cdn.example.org/a.png", "https://sponsor.example.org"),
        )
        .await
        .expect("create ad");
    let service = IngestionService::new(storage.clone(), storage.clone(), &tracking(dedup_window_secs));
    (service, storage, dir)
}

async fn impressions_for(storage: &SeaOrmStorage, ad_id: &str) -> i64 {
    storage
        .count_events_by_ad(EventKind::Impression, &EventFilter::for_ad(ad_id))
        .await
        .expect("count")
        .into_iter()
        .map(|row| row.count)
        .sum()
}

#[tokio::test]
async fn valid_impression_is_recorded() {
    let (service, storage, _dir) = seeded(10).await;

    let ack = service
        .ingest(
            EventKind::Impression,
            TrackEventPayload::new("ad-1", "sess_a", "/articles/1"),
        )
        .await
        .expect("ingest");

    assert!(ack.recorded);
    assert!(!ack.duplicate);
    assert_eq!(impressions_for(&storage, "ad-1").await, 1);
}

#[tokio::test]
async fn repeated_impression_within_window_is_deduplicated() {
    let (service, storage, _dir) = seeded(10).await;
    let payload = TrackEventPayload::new("ad-1", "sess_a", "/articles/1");

    let first = service.ingest(EventKind::Impression, payload.clone()).await.unwrap();
    let second = service.ingest(EventKind::Impression, payload).await.unwrap();

    assert!(first.recorded);
    assert!(second.duplicate);
    assert!(!second.recorded);
    assert_eq!(impressions_for(&storage, "ad-1").await, 1);
}

#[tokio::test]
async fn dedup_disabled_records_every_event() {
    let (service, storage, _dir) = seeded(0).await;
    let payload = TrackEventPayload::new("ad-1", "sess_a", "/articles/1");

    for _ in 0..3 {
        let ack = service.ingest(EventKind::Impression, payload.clone()).await.unwrap();
        assert!(ack.recorded);
    }
    assert_eq!(impressions_for(&storage, "ad-1").await, 3);
}

#[tokio::test]
async fn clicks_are_never_deduplicated() {
    let (service, storage, _dir) = seeded(10).await;
    let payload = TrackEventPayload::new("ad-1", "sess_a", "/articles/1");

    service.ingest(EventKind::Click, payload.clone()).await.unwrap();
    let ack = service.ingest(EventKind::Click, payload).await.unwrap();
    assert!(ack.recorded);

    let clicks: i64 = storage
        .count_events_by_ad(EventKind::Click, &EventFilter::for_ad("ad-1"))
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.count)
        .sum();
    assert_eq!(clicks, 2);
}

#[tokio::test]
async fn unknown_ad_is_rejected() {
    let (service, _storage, _dir) = seeded(10).await;

    let err = service
        .ingest(
            EventKind::Impression,
            TrackEventPayload::new("ghost", "sess_a", "/"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AdTrackError::AdNotFound(_)));
}

#[tokio::test]
async fn missing_session_is_invalid() {
    let (service, _storage, _dir) = seeded(10).await;

    let payload = TrackEventPayload {
        ad_id: Some("ad-1".into()),
        ..Default::default()
    };
    let err = service.ingest(EventKind::Click, payload).await.unwrap_err();

    assert!(matches!(err, AdTrackError::InvalidEvent(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn view_requires_non_negative_duration() {
    let (service, storage, _dir) = seeded(10).await;

    let missing = service
        .ingest(EventKind::View, TrackEventPayload::new("ad-1", "sess_a", "/"))
        .await
        .unwrap_err();
    assert!(matches!(missing, AdTrackError::InvalidEvent(_)));

    let mut negative = TrackEventPayload::new("ad-1", "sess_a", "/");
    negative.view_duration = Some(-5);
    let err = service.ingest(EventKind::View, negative).await.unwrap_err();
    assert!(matches!(err, AdTrackError::InvalidEvent(_)));

    let ok = service
        .ingest(
            EventKind::View,
            TrackEventPayload::new("ad-1", "sess_a", "/").with_view_duration(1500),
        )
        .await
        .unwrap();
    assert!(ok.recorded);

    let totals = storage
        .view_totals_by_ad(&EventFilter::for_ad("ad-1"))
        .await
        .unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].count, 1);
    assert_eq!(totals[0].total_duration, Some(1500));
}

#[tokio::test]
async fn inactive_ads_still_accept_events() {
    let (storage, _dir) = create_temp_storage().await;
    storage
        .create_ad(NewAdvertisement::new("old", "Retired", Placement::Footer).inactive())
        .await
        .unwrap();
    let service = IngestionService::new(storage.clone(), storage.clone(), &tracking(10));

    let ack = service
        .ingest(EventKind::Click, TrackEventPayload::new("old", "sess_a", "/"))
        .await
        .unwrap();
    assert!(ack.recorded);
}

/// 写入总是失败的 sink
struct FailingSink;

#[async_trait::async_trait]
impl EventSink for FailingSink {
    async fn record_event(&self, _event: EngagementEvent) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

#[tokio::test]
async fn sink_failure_surfaces_as_ingestion_failed_and_releases_dedup_slot() {
    let (_service, storage, _dir) = seeded(10).await;
    let directory: Arc<dyn AdDirectory> = storage.clone();
    let service = IngestionService::new(Arc::new(FailingSink), directory, &tracking(10));
    let payload = TrackEventPayload::new("ad-1", "sess_a", "/");

    let first = service
        .ingest(EventKind::Impression, payload.clone())
        .await
        .unwrap_err();
    assert!(matches!(first, AdTrackError::IngestionFailed(_)));
    assert!(!first.is_client_error());

    // 写入失败不占用去重窗口，重试仍会尝试写入
    let second = service.ingest(EventKind::Impression, payload).await.unwrap_err();
    assert!(matches!(second, AdTrackError::IngestionFailed(_)));
}

#[tokio::test]
async fn active_ads_filter_by_placement_and_end_date() {
    let (storage, _dir) = create_temp_storage().await;
    let now = Utc::now();
    for ad in [
        NewAdvertisement::new("side-live", "Live", Placement::Sidebar),
        NewAdvertisement::new("side-off", "Off", Placement::Sidebar).inactive(),
        NewAdvertisement::new("side-ended", "Ended", Placement::Sidebar)
            .ending_at(now - Duration::days(1)),
        NewAdvertisement::new("head-live", "Header", Placement::Header),
    ] {
        storage.create_ad(ad).await.unwrap();
    }
    let service = IngestionService::new(storage.clone(), storage.clone(), &tracking(10));

    let ads: Vec<Advertisement> = service.list_active_ads(Placement::Sidebar).await.unwrap();
    let ids: Vec<&str> = ads.iter().map(|ad| ad.id.as_str()).collect();
    assert_eq!(ids, vec!["side-live"]);
}
