//! Analytics API 端点
//!
//! - 单广告与汇总指标
//! - 指标 CSV 导出（供外部报表使用）
//! - 按天趋势

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use tracing::{debug, error};

use crate::analytics::AdMetrics;
use crate::services::{DEFAULT_TIMESERIES_DAYS, MetricsService};

use super::error_code::ErrorCode;
use super::helpers::{api_result, error_from_adtrack, error_response};
use super::types::{MetricsQuery, TimeSeriesQuery};

/// GET /v1/analytics/metrics
pub async fn get_metrics(
    query: web::Query<MetricsQuery>,
    service: web::Data<Arc<MetricsService>>,
) -> impl Responder {
    let query = query.into_inner();
    let report = async {
        let range = service.parse_date_range(query.from.as_deref(), query.to.as_deref())?;
        service.compute_metrics(query.ad_id.as_deref(), range).await
    }
    .await;
    api_result(report)
}

/// GET /v1/analytics/metrics/export
pub async fn export_metrics(
    query: web::Query<MetricsQuery>,
    service: web::Data<Arc<MetricsService>>,
) -> impl Responder {
    let query = query.into_inner();
    let range = match service.parse_date_range(query.from.as_deref(), query.to.as_deref()) {
        Ok(range) => range,
        Err(e) => return error_from_adtrack(&e),
    };
    let report = match service.compute_metrics(query.ad_id.as_deref(), range).await {
        Ok(report) => report,
        Err(e) => return error_from_adtrack(&e),
    };

    let body = match render_metrics_csv(&report.per_ad) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to render metrics CSV: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::CsvGenerationError,
                "Failed to generate CSV",
            );
        }
    };
    debug!("Exported metrics for {} ads", report.per_ad.len());

    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"ad_metrics_{}.csv\"",
                Utc::now().format("%Y%m%d")
            ),
        ))
        .body(body)
}

/// GET /v1/analytics/timeseries
pub async fn get_time_series(
    query: web::Query<TimeSeriesQuery>,
    service: web::Data<Arc<MetricsService>>,
) -> impl Responder {
    let query = query.into_inner();
    let days = query.days.unwrap_or(DEFAULT_TIMESERIES_DAYS);
    api_result(
        service
            .compute_time_series(query.ad_id.as_deref(), days)
            .await,
    )
}

/// 把单广告指标渲染成 CSV
pub fn render_metrics_csv(rows: &[AdMetrics]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "ad_id",
        "ad_name",
        "placement",
        "is_active",
        "impressions",
        "views",
        "clicks",
        "unique_visitors",
        "ctr",
        "viewability",
        "click_through_rate",
        "avg_view_duration",
        "engagement_rate",
    ])?;
    for m in rows {
        wtr.write_record([
            m.ad_id.clone(),
            m.ad_name.clone(),
            m.placement.clone(),
            m.is_active.to_string(),
            m.impressions.to_string(),
            m.views.to_string(),
            m.clicks.to_string(),
            m.unique_visitors.to_string(),
            format!("{:.2}", m.ctr),
            format!("{:.2}", m.viewability),
            format!("{:.2}", m.click_through_rate),
            format!("{:.2}", m.avg_view_duration),
            format!("{:.2}", m.engagement_rate),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// Analytics 路由配置
pub fn analytics_routes() -> actix_web::Scope {
    web::scope("/analytics")
        .route("/metrics", web::get().to(get_metrics))
        .route("/metrics/export", web::get().to(export_metrics))
        .route("/timeseries", web::get().to(get_time_series))
        .route("/stream", web::get().to(super::stream::stream_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str) -> AdMetrics {
        AdMetrics {
            ad_id: id.to_string(),
            ad_name: name.to_string(),
            placement: "sidebar".to_string(),
            is_active: true,
            impressions: 40,
            views: 20,
            clicks: 5,
            unique_visitors: 12,
            ctr: 12.5,
            viewability: 50.0,
            click_through_rate: 25.0,
            avg_view_duration: 1.5,
            engagement_rate: 62.5,
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_ad() {
        let csv = render_metrics_csv(&[row("ad-1", "Spring"), row("ad-2", "Books, new")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ad_id,ad_name,placement"));
        assert_eq!(
            lines[1],
            "ad-1,Spring,sidebar,true,40,20,5,12,12.50,50.00,25.00,1.50,62.50"
        );
        // 含逗号的字段被加引号
        assert!(lines[2].starts_with("ad-2,\"Books, new\","));
    }

    #[test]
    fn empty_report_still_has_header() {
        let csv = render_metrics_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
