//! 实时指标推送
//!
//! 每个订阅者拥有独立的定时器：连接建立时立即推送一次快照，之后按固定间隔
//! 重新计算并推送。定时器与订阅登记都归订阅流所有，流被丢弃（客户端断开）
//! 时一并释放。

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::stream::{self, Stream};
use serde_json::json;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use super::metrics_service::{MetricsService, SnapshotEntry};
use crate::config::StreamConfig;
use crate::errors::{AdTrackError, Result};

/// 快照来源
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, window: chrono::Duration) -> Result<Vec<SnapshotEntry>>;
}

#[async_trait::async_trait]
impl SnapshotSource for MetricsService {
    async fn snapshot(&self, window: chrono::Duration) -> Result<Vec<SnapshotEntry>> {
        self.realtime_snapshot(window).await
    }
}

/// 订阅登记信息
#[derive(Debug, Clone)]
pub struct SubscriberInfo {
    pub opened_at: DateTime<Utc>,
}

pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>;

pub struct RealtimePublisher {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    window: chrono::Duration,
    subscribers: Arc<DashMap<u64, SubscriberInfo>>,
    next_id: AtomicU64,
}

/// 订阅存活期间持有；析构时注销
struct SubscriberGuard {
    id: u64,
    registry: Arc<DashMap<u64, SubscriberInfo>>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        if self.registry.remove(&self.id).is_some() {
            debug!("Realtime subscriber {} disconnected", self.id);
        }
    }
}

struct StreamState {
    source: Arc<dyn SnapshotSource>,
    ticker: Interval,
    window: chrono::Duration,
    _guard: SubscriberGuard,
}

impl RealtimePublisher {
    pub fn new(source: Arc<dyn SnapshotSource>, interval: Duration, window: chrono::Duration) -> Self {
        Self {
            source,
            interval: interval.max(Duration::from_millis(100)),
            window,
            subscribers: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(source: Arc<dyn SnapshotSource>, config: &StreamConfig) -> Self {
        let window_hours = i64::try_from(config.window_hours).unwrap_or(24);
        Self::new(
            source,
            Duration::from_secs(config.interval_secs.max(1)),
            chrono::Duration::hours(window_hours),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 当前在线订阅数
    pub fn active_subscribers(&self) -> usize {
        self.subscribers.len()
    }

    /// 最早仍在线的订阅的建立时间
    pub fn oldest_subscriber_since(&self) -> Option<DateTime<Utc>> {
        self.subscribers.iter().map(|entry| entry.opened_at).min()
    }

    /// 打开一个订阅
    ///
    /// 返回的流产出完整的 SSE 帧。快照计算失败时推送 `event: error` 帧，
    /// 流本身不中断；帧编码失败视为传输错误并结束流。
    pub fn subscribe(&self) -> SnapshotStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.insert(
            id,
            SubscriberInfo {
                opened_at: Utc::now(),
            },
        );
        info!(
            "Realtime subscriber {} connected ({} active)",
            id,
            self.subscribers.len()
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let state = StreamState {
            source: self.source.clone(),
            ticker,
            window: self.window,
            _guard: SubscriberGuard {
                id,
                registry: self.subscribers.clone(),
            },
        };

        Box::pin(stream::unfold(Some(state), |state| async move {
            let mut state = state?;
            // 首次 tick 立即完成
            state.ticker.tick().await;
            match state.source.snapshot(state.window).await {
                Ok(entries) => match encode_snapshot(&entries) {
                    Ok(frame) => Some((Ok(frame), Some(state))),
                    Err(e) => Some((Err(e), None)),
                },
                Err(e) => {
                    warn!("Realtime snapshot failed: {}", e);
                    Some((Ok(encode_error(&e)), Some(state)))
                }
            }
        }))
    }
}

/// `data: <json>\n\n`
pub fn encode_snapshot(entries: &[SnapshotEntry]) -> Result<Bytes> {
    let body = serde_json::to_string(entries)
        .map_err(|e| AdTrackError::stream_transport(format!("failed to encode snapshot: {}", e)))?;
    Ok(Bytes::from(format!("data: {}\n\n", body)))
}

/// `event: error\ndata: {...}\n\n`
pub fn encode_error(err: &AdTrackError) -> Bytes {
    let body = json!({
        "error": err.error_type(),
        "message": err.message(),
    });
    Bytes::from(format!("event: error\ndata: {}\n\n", body))
}
