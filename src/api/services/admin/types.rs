//! Admin API 类型定义

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub use crate::analytics::TS_EXPORT_PATH;

/// 统一响应信封
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 指标查询参数
#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub ad_id: Option<String>,
    /// RFC3339 或 YYYY-MM-DD
    pub from: Option<String>,
    /// RFC3339 或 YYYY-MM-DD（日期形式包含当天）
    pub to: Option<String>,
}

/// 趋势查询参数
#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesQuery {
    pub ad_id: Option<String>,
    pub days: Option<u32>,
}

/// 在投广告查询参数
#[derive(Deserialize, Clone, Debug, Default, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct ActiveAdsQuery {
    pub placement: Option<String>,
}

/// 存储健康状态
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthStorageCheck {
    pub status: String,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 实时推送状态
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthStreamCheck {
    #[ts(type = "number")]
    pub active_subscribers: u64,
    #[ts(type = "number")]
    pub interval_secs: u64,
    /// 最早在线连接已保持的秒数；无连接时为 null
    #[ts(type = "number | null")]
    pub oldest_connection_secs: Option<u64>,
}

/// 健康检查项容器
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
    pub stream: HealthStreamCheck,
}

/// 健康检查响应
#[derive(Serialize, Deserialize, Clone, Debug, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u32,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AdMetrics, DailyBucket, EventKind, OverallMetrics, TrackEventPayload};
    use crate::api::services::admin::ErrorCode;
    use crate::services::{MetricsReport, SnapshotEntry, SnapshotMetrics, TrackAck};
    use crate::storage::{Advertisement, Placement};

    #[test]
    fn export_typescript_types() {
        let cfg = ts_rs::Config::from_env();
        ErrorCode::export_all(&cfg).expect("Failed to export ErrorCode");
        MetricsQuery::export_all(&cfg).expect("Failed to export MetricsQuery");
        TimeSeriesQuery::export_all(&cfg).expect("Failed to export TimeSeriesQuery");
        ActiveAdsQuery::export_all(&cfg).expect("Failed to export ActiveAdsQuery");
        HealthResponse::export_all(&cfg).expect("Failed to export HealthResponse");

        EventKind::export_all(&cfg).expect("Failed to export EventKind");
        TrackEventPayload::export_all(&cfg).expect("Failed to export TrackEventPayload");
        TrackAck::export_all(&cfg).expect("Failed to export TrackAck");
        Placement::export_all(&cfg).expect("Failed to export Placement");
        Advertisement::export_all(&cfg).expect("Failed to export Advertisement");
        AdMetrics::export_all(&cfg).expect("Failed to export AdMetrics");
        OverallMetrics::export_all(&cfg).expect("Failed to export OverallMetrics");
        MetricsReport::export_all(&cfg).expect("Failed to export MetricsReport");
        DailyBucket::export_all(&cfg).expect("Failed to export DailyBucket");
        SnapshotMetrics::export_all(&cfg).expect("Failed to export SnapshotMetrics");
        SnapshotEntry::export_all(&cfg).expect("Failed to export SnapshotEntry");

        println!("TypeScript types exported to {}", TS_EXPORT_PATH);
    }

    #[test]
    fn envelope_omits_missing_data() {
        let body = serde_json::to_value(ApiResponse::<()> {
            code: 1001,
            message: "Unauthorized".to_string(),
            data: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"code": 1001, "message": "Unauthorized"}));
    }
}
