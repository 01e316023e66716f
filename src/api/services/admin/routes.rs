//! Admin API 路由配置

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, web};
use tracing::debug;

use super::analytics::analytics_routes;
use super::error_code::ErrorCode;
use super::helpers::error_response;

/// 查询参数解析失败时同样返回统一信封
pub fn analytics_query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        debug!("Rejected analytics query: {}", err);
        let resp = error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::AnalyticsInvalidQuery,
            &format!("Invalid query parameters: {}", err),
        );
        InternalError::from_response(err, resp).into()
    })
}

/// `/v1` 路由
///
/// 包含：
/// - GET /v1/analytics/metrics - 单广告与汇总指标
/// - GET /v1/analytics/metrics/export - 指标 CSV
/// - GET /v1/analytics/timeseries - 按天趋势
/// - GET /v1/analytics/stream - 实时推送（SSE）
pub fn admin_v1_routes() -> actix_web::Scope {
    web::scope("/v1")
        .app_data(analytics_query_config())
        .service(analytics_routes())
}
