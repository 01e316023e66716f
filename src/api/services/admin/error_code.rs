//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};
use ts_rs::TS;

use super::types::TS_EXPORT_PATH;
use crate::errors::AdTrackError;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，ts-rs 自动生成 TypeScript 类型。
/// 按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证与限流
/// - 4000-4099: 导出错误
/// - 6000-6099: 聚合查询错误
/// - 7000-7099: 采集错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[ts(rename = "ErrorCode")]
#[ts(repr(enum))]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,
    InvalidDateFormat = 1012,
    ServiceUnavailable = 1030,

    // 认证与限流 2000-2099
    RateLimitExceeded = 2004,

    // 导出错误 4000-4099
    ExportFailed = 4001,
    CsvGenerationError = 4006,

    // 聚合查询错误 6000-6099
    AnalyticsQueryFailed = 6000,
    AnalyticsInvalidQuery = 6002,

    // 采集错误 7000-7099
    InvalidEvent = 7000,
    IngestionFailed = 7001,
    AdNotFound = 7002,
    StreamTransport = 7003,
    InvalidPlacement = 7004,
}

impl From<&AdTrackError> for ErrorCode {
    fn from(err: &AdTrackError) -> Self {
        match err {
            AdTrackError::InvalidEvent(_) => ErrorCode::InvalidEvent,
            AdTrackError::IngestionFailed(_) => ErrorCode::IngestionFailed,
            AdTrackError::AggregationQuery(_) => ErrorCode::AnalyticsInvalidQuery,
            AdTrackError::StreamTransport(_) => ErrorCode::StreamTransport,
            AdTrackError::AdNotFound(_) => ErrorCode::AdNotFound,
            AdTrackError::DatabaseOperation(_) => ErrorCode::AnalyticsQueryFailed,
            AdTrackError::DatabaseConfig(_) | AdTrackError::DatabaseConnection(_) => {
                ErrorCode::ServiceUnavailable
            }
            AdTrackError::Validation(_) => ErrorCode::BadRequest,
            AdTrackError::DateParse(_) => ErrorCode::InvalidDateFormat,
            AdTrackError::FileOperation(_) | AdTrackError::Serialization(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&ErrorCode::Success).unwrap(), "0");
        assert_eq!(serde_json::to_string(&ErrorCode::AdNotFound).unwrap(), "7002");
        let parsed: ErrorCode = serde_json::from_str("7000").unwrap();
        assert_eq!(parsed, ErrorCode::InvalidEvent);
    }

    #[test]
    fn tracking_errors_use_tracking_range() {
        for (err, code) in [
            (AdTrackError::invalid_event("x"), ErrorCode::InvalidEvent),
            (AdTrackError::ingestion_failed("x"), ErrorCode::IngestionFailed),
            (AdTrackError::ad_not_found("x"), ErrorCode::AdNotFound),
            (AdTrackError::stream_transport("x"), ErrorCode::StreamTransport),
        ] {
            assert_eq!(ErrorCode::from(&err), code);
            assert!((7000..7100).contains(&(code as i32)));
        }
        assert_eq!(
            ErrorCode::from(&AdTrackError::aggregation_query("bad")),
            ErrorCode::AnalyticsInvalidQuery
        );
    }
}
