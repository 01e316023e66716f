//! 广告互动事件模型与聚合计算
//!
//! - `EventKind` / `EngagementEvent`：曝光、有效浏览、点击三类事件
//! - `TrackEventPayload`：上报接口的 JSON 载荷（客户端与服务端共用）
//! - `sink`：事件写入与广告查询的存储抽象
//! - `metrics`：CTR、可见率、互动率等派生指标（纯计算）
//! - `timeseries`：按天分桶（纯计算）

pub mod metrics;
pub mod sink;
pub mod timeseries;

pub use metrics::{
    AdCounts, AdMetrics, OverallMetrics, ScopedAd, compute_ad_metrics, compute_overall, round2,
};
pub use sink::{AdDirectory, EventSink};
pub use timeseries::{DailyBucket, bucket_daily};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};
use ts_rs::TS;

/// 输出目录常量（供管理端 Dashboard 使用）
pub const TS_EXPORT_PATH: &str = "../dashboard/src/services/types.generated.ts";

/// 事件类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumIter, AsRefStr,
)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Impression,
    View,
    Click,
}

impl EventKind {
    /// 是否参与服务端短窗口去重（点击不去重，每次点击都是独立事实）
    pub fn is_deduplicated(self) -> bool {
        !matches!(self, EventKind::Click)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "impression" => Ok(Self::Impression),
            "view" => Ok(Self::View),
            "click" => Ok(Self::Click),
            _ => Err(format!(
                "Invalid event kind: '{}'. Valid: impression, view, click",
                s
            )),
        }
    }
}

/// 上报载荷
///
/// `viewDuration` 以有符号整数接收，负值由校验逻辑拒绝而非反序列化失败，
/// 以便返回明确的错误信息。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventPayload {
    #[serde(default)]
    pub ad_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_duration: Option<i64>,
}

impl TrackEventPayload {
    pub fn new(ad_id: impl Into<String>, session_id: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            ad_id: Some(ad_id.into()),
            session_id: Some(session_id.into()),
            page: Some(page.into()),
            view_duration: None,
        }
    }

    pub fn with_view_duration(mut self, duration_ms: u64) -> Self {
        self.view_duration = Some(duration_ms.min(i64::MAX as u64) as i64);
        self
    }
}

/// 已校验的互动事件（写入存储的形态）
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementEvent {
    pub kind: EventKind,
    pub ad_id: String,
    pub session_id: String,
    pub page: Option<String>,
    /// 仅 View 事件有值
    pub view_duration_ms: Option<u64>,
    /// 服务端时间戳
    pub timestamp: DateTime<Utc>,
}

impl EngagementEvent {
    pub fn new(kind: EventKind, ad_id: String, session_id: String) -> Self {
        Self {
            kind,
            ad_id,
            session_id,
            page: None,
            view_duration_ms: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_page(mut self, page: Option<String>) -> Self {
        self.page = page;
        self
    }

    pub fn with_view_duration(mut self, duration_ms: u64) -> Self {
        self.view_duration_ms = Some(duration_ms);
        self
    }
}

/// 校验广告 ID / 会话 ID 格式：1..=max_len 位字母、数字、`-`、`_`
pub fn is_valid_identifier(value: &str, max_len: usize) -> bool {
    !value.is_empty()
        && value.len() <= max_len
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
