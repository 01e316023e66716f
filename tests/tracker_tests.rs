//! Viewport engagement detector tests
//!
//! Drives `MountedAd` with a recording transport under a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use adtrack::analytics::{EventKind, TrackEventPayload};
use adtrack::tracker::{Activation, AdContext, EventTransport, MountedAd, Thresholds};
use parking_lot::Mutex;
use tokio::time::sleep;

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<(EventKind, TrackEventPayload)>>,
    fail: bool,
}

impl RecordingTransport {
    fn kinds(&self) -> Vec<EventKind> {
        self.sent.lock().iter().map(|(kind, _)| *kind).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.sent.lock().iter().filter(|(k, _)| *k == kind).count()
    }
}

#[async_trait::async_trait]
impl EventTransport for RecordingTransport {
    async fn send(&self, kind: EventKind, payload: TrackEventPayload) -> anyhow::Result<()> {
        self.sent.lock().push((kind, payload));
        if self.fail {
            anyhow::bail!("network unreachable");
        }
        Ok(())
    }
}

fn ad() -> AdContext {
    AdContext {
        ad_id: "ad-1".into(),
        target_url: "https://sponsor.example.org/landing".into(),
        page: "/articles/42".into(),
    }
}

fn mount(transport: &Arc<RecordingTransport>) -> MountedAd {
    MountedAd::mount(ad(), "sess_test", Thresholds::default(), transport.clone())
}

/// 让定时器任务有机会运行
async fn settle(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn visible_for_999ms_does_not_count_as_view() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    mounted.on_visibility_change(0.8).await;
    settle(999).await;
    mounted.on_visibility_change(0.2).await;
    settle(5_000).await;

    assert_eq!(transport.count(EventKind::View), 0);
    assert!(!mounted.view_sent());
    assert!(!mounted.timer_pending());
}

#[tokio::test(start_paused = true)]
async fn one_second_of_half_visibility_fires_one_view() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    mounted.on_visibility_change(0.5).await;
    settle(1_100).await;

    assert_eq!(transport.kinds(), vec![EventKind::Impression, EventKind::View]);
    let sent = transport.sent.lock();
    let (_, payload) = &sent[1];
    assert_eq!(payload.ad_id.as_deref(), Some("ad-1"));
    assert_eq!(payload.session_id.as_deref(), Some("sess_test"));
    assert_eq!(payload.page.as_deref(), Some("/articles/42"));
    assert!(payload.view_duration.unwrap_or(0) >= 1000);
    drop(sent);

    // 再次进出视口不会产生新的曝光或浏览
    mounted.on_visibility_change(0.0).await;
    mounted.on_visibility_change(1.0).await;
    settle(3_000).await;
    assert_eq!(transport.count(EventKind::Impression), 1);
    assert_eq!(transport.count(EventKind::View), 1);
}

#[tokio::test(start_paused = true)]
async fn interrupted_visibility_does_not_accumulate() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    mounted.on_visibility_change(0.9).await;
    settle(700).await;
    mounted.on_visibility_change(0.1).await;
    settle(100).await;
    mounted.on_visibility_change(0.9).await;
    settle(700).await;
    mounted.on_visibility_change(0.1).await;
    settle(5_000).await;

    assert_eq!(transport.count(EventKind::View), 0);
    assert_eq!(transport.count(EventKind::Impression), 1);
}

#[tokio::test(start_paused = true)]
async fn below_one_percent_is_not_an_impression() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    mounted.on_visibility_change(0.005).await;
    settle(2_000).await;

    assert!(transport.kinds().is_empty());
    assert!(!mounted.impression_sent());
}

#[tokio::test(start_paused = true)]
async fn unmount_cancels_pending_view() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    mounted.on_visibility_change(0.7).await;
    assert!(mounted.timer_pending());
    settle(500).await;
    mounted.unmount();
    settle(2_000).await;

    assert_eq!(transport.kinds(), vec![EventKind::Impression]);
}

#[tokio::test(start_paused = true)]
async fn pointer_activation_records_click_and_opens_new_context() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    let intent = mounted.activate(Activation::Pointer).await.unwrap();
    assert_eq!(intent.url, "https://sponsor.example.org/landing");
    assert_eq!(intent.target, "_blank");
    assert!(intent.rel.contains("noopener"));

    mounted.activate(Activation::Key("Enter".into())).await.unwrap();
    mounted.activate(Activation::Key(" ".into())).await.unwrap();
    assert_eq!(transport.count(EventKind::Click), 3);
}

#[tokio::test(start_paused = true)]
async fn non_activating_keys_are_ignored() {
    let transport = Arc::new(RecordingTransport::default());
    let mounted = mount(&transport);

    for key in ["Tab", "a", "Escape"] {
        assert!(mounted.activate(Activation::Key(key.into())).await.is_none());
    }
    assert_eq!(transport.count(EventKind::Click), 0);
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_swallowed() {
    let transport = Arc::new(RecordingTransport {
        fail: true,
        ..Default::default()
    });
    let mounted = mount(&transport);

    mounted.on_visibility_change(1.0).await;
    settle(1_100).await;
    let intent = mounted.activate(Activation::Pointer).await;

    // 失败不重试，也不影响导航
    assert!(intent.is_some());
    assert_eq!(
        transport.kinds(),
        vec![EventKind::Impression, EventKind::View, EventKind::Click]
    );
    assert!(mounted.view_sent());
}

#[tokio::test(start_paused = true)]
async fn instances_of_the_same_ad_track_independently() {
    let transport = Arc::new(RecordingTransport::default());
    let first = mount(&transport);
    let second = mount(&transport);

    first.on_visibility_change(0.6).await;
    second.on_visibility_change(0.6).await;
    settle(1_100).await;

    assert_eq!(transport.count(EventKind::Impression), 2);
    assert_eq!(transport.count(EventKind::View), 2);
}
