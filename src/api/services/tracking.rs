//! 公开采集端点
//!
//! 期刊页面上的采集脚本直接调用，不鉴权，按来源 IP 限流。

use std::str::FromStr;
use std::sync::Arc;

use actix_governor::{Governor, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, Responder, web};
use governor::middleware::NoOpMiddleware;
use tracing::{debug, trace};

use crate::analytics::{EventKind, TrackEventPayload};
use crate::config::ApiConfig;
use crate::services::IngestionService;
use crate::storage::Placement;

use super::admin::{ActiveAdsQuery, ErrorCode, api_result, error_response};

/// 上报载荷上限
const MAX_TRACK_PAYLOAD_BYTES: usize = 16 * 1024;

async fn track(
    kind: EventKind,
    payload: web::Json<TrackEventPayload>,
    service: web::Data<Arc<IngestionService>>,
) -> actix_web::HttpResponse {
    trace!("Track {} request", kind);
    api_result(service.ingest(kind, payload.into_inner()).await)
}

/// POST /track/impression
pub async fn track_impression(
    payload: web::Json<TrackEventPayload>,
    service: web::Data<Arc<IngestionService>>,
) -> impl Responder {
    track(EventKind::Impression, payload, service).await
}

/// POST /track/view
pub async fn track_view(
    payload: web::Json<TrackEventPayload>,
    service: web::Data<Arc<IngestionService>>,
) -> impl Responder {
    track(EventKind::View, payload, service).await
}

/// POST /track/click
pub async fn track_click(
    payload: web::Json<TrackEventPayload>,
    service: web::Data<Arc<IngestionService>>,
) -> impl Responder {
    track(EventKind::Click, payload, service).await
}

/// GET /ads?placement=<slot>
pub async fn list_active_ads(
    query: web::Query<ActiveAdsQuery>,
    service: web::Data<Arc<IngestionService>>,
) -> impl Responder {
    let Some(raw) = query.placement.as_deref().filter(|p| !p.trim().is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidPlacement,
            &format!("placement is required. Valid: {}", Placement::valid_values()),
        );
    };
    let placement = match Placement::from_str(raw.trim()) {
        Ok(p) => p,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidPlacement,
                &format!(
                    "Invalid placement '{}'. Valid: {}",
                    raw,
                    Placement::valid_values()
                ),
            );
        }
    };
    api_result(service.list_active_ads(placement).await)
}

/// JSON 解析失败也返回统一信封
///
/// `sendBeacon` 可能以 `text/plain` 发送，因此不强制 Content-Type。
pub fn track_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_TRACK_PAYLOAD_BYTES)
        .content_type_required(false)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            debug!("Rejected track payload: {}", err);
            let resp = error_response(
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidEvent,
                &format!("Malformed event payload: {}", err),
            );
            InternalError::from_response(err, resp).into()
        })
}

/// 创建采集限流器
///
/// 超限返回 HTTP 429 Too Many Requests
pub fn tracking_rate_limiter(api: &ApiConfig) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_request_ms = (1000 / api.rate_limit_per_second.max(1)).max(1);
    let burst = api.rate_limit_burst.max(1);
    let config = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_request_ms)
        .burst_size(burst)
        .finish()
        .unwrap_or_default();

    debug!(
        "Tracking rate limiter created: 1 req/{}ms, burst {}",
        per_request_ms, burst
    );
    Governor::new(&config)
}

/// 在投广告路由 `/ads`
pub fn ads_routes() -> actix_web::Resource {
    web::resource("/ads").route(web::get().to(list_active_ads))
}

/// 上报路由 `/track`（不含限流，由调用方按需包裹）
///
/// 包含：
/// - POST /track/impression
/// - POST /track/view
/// - POST /track/click
pub fn track_routes() -> actix_web::Scope {
    web::scope("/track")
        .app_data(track_json_config())
        .route("/impression", web::post().to(track_impression))
        .route("/view", web::post().to(track_view))
        .route("/click", web::post().to(track_click))
}
