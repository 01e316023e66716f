//! 事件上报服务
//!
//! 校验载荷、查重、落库。不做任何同步聚合，指标全部在读取时计算。

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};
use ts_rs::TS;

use crate::analytics::{
    AdDirectory, EngagementEvent, EventKind, EventSink, TS_EXPORT_PATH, TrackEventPayload,
    is_valid_identifier,
};
use crate::config::TrackingConfig;
use crate::errors::{AdTrackError, Result};
use crate::storage::{Advertisement, Placement, SeaOrmStorage};

pub const MAX_AD_ID_LENGTH: usize = 64;
pub const MAX_SESSION_ID_LENGTH: usize = 128;

/// 上报回执
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct TrackAck {
    /// 本次请求是否写入了新记录
    pub recorded: bool,
    /// 是否因短窗口去重而被忽略
    pub duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    kind: EventKind,
    ad_id: String,
    session_id: String,
    page: Option<String>,
}

impl DedupKey {
    fn of(event: &EngagementEvent) -> Self {
        Self {
            kind: event.kind,
            ad_id: event.ad_id.clone(),
            session_id: event.session_id.clone(),
            page: event.page.clone(),
        }
    }
}

pub struct IngestionService {
    sink: Arc<dyn EventSink>,
    directory: Arc<dyn AdDirectory>,
    /// 曝光/浏览的短窗口去重，窗口为 0 时关闭
    recent: Option<Cache<DedupKey, ()>>,
    max_page_length: usize,
}

impl IngestionService {
    pub fn new(
        sink: Arc<dyn EventSink>,
        directory: Arc<dyn AdDirectory>,
        tracking: &TrackingConfig,
    ) -> Self {
        let recent = (tracking.dedup_window_secs > 0).then(|| {
            Cache::builder()
                .time_to_live(Duration::from_secs(tracking.dedup_window_secs))
                .max_capacity(tracking.dedup_capacity)
                .build()
        });

        Self {
            sink,
            directory,
            recent,
            max_page_length: tracking.max_page_length,
        }
    }

    /// 以 SeaOrmStorage 同时作为 sink 与广告目录
    pub fn from_storage(storage: Arc<SeaOrmStorage>) -> Self {
        let config = crate::config::get_config();
        Self::new(storage.clone(), storage, &config.tracking)
    }

    /// 校验载荷并转换为待写入事件（时间戳由服务端赋值）
    pub fn validate(
        kind: EventKind,
        payload: TrackEventPayload,
        max_page_length: usize,
    ) -> Result<EngagementEvent> {
        let ad_id = required_identifier("adId", payload.ad_id, MAX_AD_ID_LENGTH)?;
        let session_id =
            required_identifier("sessionId", payload.session_id, MAX_SESSION_ID_LENGTH)?;

        let page = payload
            .page
            .map(|p| p.trim().chars().take(max_page_length).collect::<String>())
            .filter(|p| !p.is_empty());

        let mut event = EngagementEvent::new(kind, ad_id, session_id).with_page(page);

        if kind == EventKind::View {
            let duration = payload.view_duration.ok_or_else(|| {
                AdTrackError::invalid_event("viewDuration is required for view events")
            })?;
            if duration < 0 {
                return Err(AdTrackError::invalid_event(format!(
                    "viewDuration must be >= 0, got {}",
                    duration
                )));
            }
            event = event.with_view_duration(duration as u64);
        }

        Ok(event)
    }

    /// 记录一次事件
    pub async fn ingest(&self, kind: EventKind, payload: TrackEventPayload) -> Result<TrackAck> {
        let event = Self::validate(kind, payload, self.max_page_length)?;

        let exists = self.directory.ad_exists(&event.ad_id).await.map_err(|e| {
            error!("Ad lookup failed for '{}': {:#}", event.ad_id, e);
            AdTrackError::ingestion_failed(format!("ad lookup failed: {}", e))
        })?;
        if !exists {
            return Err(AdTrackError::ad_not_found(format!(
                "Advertisement '{}' does not exist",
                event.ad_id
            )));
        }

        // 先占位再写入，保证并发的重复请求只有一个落库
        let claimed = match (&self.recent, kind.is_deduplicated()) {
            (Some(recent), true) => {
                let key = DedupKey::of(&event);
                if !recent.entry(key.clone()).or_insert(()).is_fresh() {
                    trace!(
                        "Duplicate {} ignored: ad={} session={}",
                        kind, event.ad_id, event.session_id
                    );
                    return Ok(TrackAck {
                        recorded: false,
                        duplicate: true,
                    });
                }
                Some(key)
            }
            _ => None,
        };

        let ad_id = event.ad_id.clone();
        if let Err(e) = self.sink.record_event(event).await {
            if let (Some(recent), Some(key)) = (&self.recent, claimed) {
                recent.invalidate(&key);
            }
            error!("Failed to record {} for ad '{}': {:#}", kind, ad_id, e);
            return Err(AdTrackError::ingestion_failed(format!(
                "failed to persist {} event: {}",
                kind, e
            )));
        }

        debug!("{} accepted for ad {}", kind, ad_id);
        Ok(TrackAck {
            recorded: true,
            duplicate: false,
        })
    }

    /// 投放侧协作方：指定位置的可投放广告
    pub async fn list_active_ads(&self, placement: Placement) -> Result<Vec<Advertisement>> {
        self.directory
            .list_active_ads(placement)
            .await
            .map_err(|e| AdTrackError::database_operation(format!("{:#}", e)))
    }
}

fn required_identifier(field: &str, value: Option<String>, max_len: usize) -> Result<String> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AdTrackError::invalid_event(format!("{} is required", field)))?;

    if !is_valid_identifier(&value, max_len) {
        return Err(AdTrackError::invalid_event(format!(
            "{} is malformed (expected 1-{} chars of [A-Za-z0-9_-])",
            field, max_len
        )));
    }
    Ok(value)
}
