//! Metrics service layer
//!
//! Read-only aggregation over the raw event tables, shared between the HTTP
//! API, the realtime stream and the CLI reports.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::analytics::timeseries::{today_in, window_bounds};
use crate::analytics::{
    AdCounts, AdMetrics, DailyBucket, EventKind, OverallMetrics, ScopedAd, TS_EXPORT_PATH,
    bucket_daily, compute_ad_metrics, compute_overall, round2,
};
use crate::config::AnalyticsConfig;
use crate::errors::{AdTrackError, Result};
use crate::storage::{Advertisement, EventFilter, SeaOrmStorage};

pub const DEFAULT_TIMESERIES_DAYS: u32 = 7;

/// 指标报表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub per_ad: Vec<AdMetrics>,
    pub overall: OverallMetrics,
}

/// 实时快照中的精简指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetrics {
    #[ts(type = "number")]
    pub impressions: u64,
    #[ts(type = "number")]
    pub views: u64,
    #[ts(type = "number")]
    pub clicks: u64,
    pub ctr: f64,
    pub viewability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub ad_id: String,
    pub ad_name: String,
    pub metrics: SnapshotMetrics,
}

/// 查询时间范围，`to` 为开区间
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Metrics 服务
pub struct MetricsService {
    storage: Arc<SeaOrmStorage>,
    offset: FixedOffset,
    max_timeseries_days: u32,
}

impl MetricsService {
    pub fn new(storage: Arc<SeaOrmStorage>, analytics: &AnalyticsConfig) -> Self {
        Self {
            storage,
            offset: reference_offset(analytics.timezone_offset_minutes),
            max_timeseries_days: analytics.max_timeseries_days.max(1),
        }
    }

    pub fn from_config(storage: Arc<SeaOrmStorage>) -> Self {
        let config = crate::config::get_config();
        Self::new(storage, &config.analytics)
    }

    /// 解析查询时间范围
    ///
    /// 支持 RFC3339 和 YYYY-MM-DD。日期形式的 `to` 包含当天全天；
    /// 两端均可省略；`from` 晚于 `to` 视为错误。
    pub fn parse_date_range(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<DateRange> {
        parse_date_range(from, to, self.offset)
    }

    /// 计算单广告与汇总指标
    pub async fn compute_metrics(
        &self,
        ad_id: Option<&str>,
        range: DateRange,
    ) -> Result<MetricsReport> {
        info!(
            "Metrics: compute ad={} from={:?} to={:?}",
            ad_id.unwrap_or("*"),
            range.from,
            range.to
        );

        let ads = self.ads_in_scope(ad_id).await?;
        let filter = EventFilter {
            ad_id: ad_id.map(str::to_string),
            from: range.from,
            to: range.to,
        };
        let scoped = self.scoped_counts(&ads, &filter).await?;

        let report = MetricsReport {
            per_ad: scoped.iter().map(compute_ad_metrics).collect(),
            overall: compute_overall(&scoped),
        };

        debug!("Metrics: {} ads in scope", report.per_ad.len());
        Ok(report)
    }

    /// 按天分桶的趋势
    pub async fn compute_time_series(
        &self,
        ad_id: Option<&str>,
        days: u32,
    ) -> Result<Vec<DailyBucket>> {
        self.compute_time_series_at(ad_id, days, Utc::now()).await
    }

    pub async fn compute_time_series_at(
        &self,
        ad_id: Option<&str>,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyBucket>> {
        if days == 0 || days > self.max_timeseries_days {
            return Err(AdTrackError::aggregation_query(format!(
                "days must be between 1 and {}, got {}",
                self.max_timeseries_days, days
            )));
        }
        if let Some(id) = ad_id {
            self.ads_in_scope(Some(id)).await?;
        }

        let today: NaiveDate = today_in(self.offset, now);
        let (start, end) = window_bounds(today, days, self.offset);
        let filter = EventFilter {
            ad_id: ad_id.map(str::to_string),
            from: Some(start),
            to: Some(end),
        };

        info!(
            "Metrics: time series ad={} days={} [{} .. {})",
            ad_id.unwrap_or("*"),
            days,
            start,
            end
        );

        let (impressions, views, clicks) = tokio::try_join!(
            self.storage.event_timestamps(EventKind::Impression, &filter),
            self.storage.event_timestamps(EventKind::View, &filter),
            self.storage.event_timestamps(EventKind::Click, &filter),
        )
        .map_err(read_failed)?;

        let events: Vec<(EventKind, DateTime<Utc>)> = impressions
            .into_iter()
            .map(|t| (EventKind::Impression, t))
            .chain(views.into_iter().map(|t| (EventKind::View, t)))
            .chain(clicks.into_iter().map(|t| (EventKind::Click, t)))
            .collect();

        Ok(bucket_daily(&events, today, days, self.offset))
    }

    /// 最近 `window` 内所有广告的精简指标
    pub async fn realtime_snapshot(&self, window: Duration) -> Result<Vec<SnapshotEntry>> {
        let ads = self.ads_in_scope(None).await?;
        let filter = EventFilter::default().between(Some(Utc::now() - window), None);
        let scoped = self.scoped_counts(&ads, &filter).await?;

        Ok(scoped
            .into_iter()
            .map(|ad| SnapshotEntry {
                metrics: SnapshotMetrics {
                    impressions: ad.counts.impressions,
                    views: ad.counts.views,
                    clicks: ad.counts.clicks,
                    ctr: round2(ad.counts.ctr()),
                    viewability: round2(ad.counts.viewability()),
                },
                ad_id: ad.ad_id,
                ad_name: ad.ad_name,
            })
            .collect())
    }

    /// 统计范围内的广告：指定 adId 时只含该广告，否则为全部广告（含停用、过期）
    async fn ads_in_scope(&self, ad_id: Option<&str>) -> Result<Vec<Advertisement>> {
        match ad_id {
            Some(id) => match self.storage.get_ad(id).await.map_err(read_failed)? {
                Some(ad) => Ok(vec![ad]),
                None => Err(AdTrackError::ad_not_found(format!(
                    "Advertisement '{}' does not exist",
                    id
                ))),
            },
            None => self.storage.list_ads().await.map_err(read_failed),
        }
    }

    async fn scoped_counts(
        &self,
        ads: &[Advertisement],
        filter: &EventFilter,
    ) -> Result<Vec<ScopedAd>> {
        let storage = &self.storage;
        let (impressions, views, clicks, imp_sessions, view_sessions, click_sessions) = tokio::try_join!(
            storage.count_events_by_ad(EventKind::Impression, filter),
            storage.view_totals_by_ad(filter),
            storage.count_events_by_ad(EventKind::Click, filter),
            storage.distinct_sessions(EventKind::Impression, filter),
            storage.distinct_sessions(EventKind::View, filter),
            storage.distinct_sessions(EventKind::Click, filter),
        )
        .map_err(read_failed)?;

        let mut counts: HashMap<String, AdCounts> = HashMap::with_capacity(ads.len());
        for row in impressions {
            counts.entry(row.ad_id).or_default().impressions = row.count.max(0) as u64;
        }
        for row in views {
            let entry = counts.entry(row.ad_id).or_default();
            entry.views = row.count.max(0) as u64;
            entry.total_view_duration_ms = row.total_duration.unwrap_or(0).max(0) as u64;
        }
        for row in clicks {
            counts.entry(row.ad_id).or_default().clicks = row.count.max(0) as u64;
        }

        // 同一会话在三类事件中只算一次
        let mut visitors: HashMap<String, HashSet<String>> = HashMap::new();
        for (ad_id, session_id) in imp_sessions
            .into_iter()
            .chain(view_sessions)
            .chain(click_sessions)
        {
            visitors.entry(ad_id).or_default().insert(session_id);
        }
        for (ad_id, sessions) in visitors {
            counts.entry(ad_id).or_default().unique_visitors = sessions.len() as u64;
        }

        Ok(ads
            .iter()
            .map(|ad| ScopedAd {
                ad_id: ad.id.clone(),
                ad_name: ad.name.clone(),
                placement: ad.placement.to_string(),
                is_active: ad.is_active,
                counts: counts.get(&ad.id).copied().unwrap_or_default(),
            })
            .collect())
    }
}

fn read_failed(e: anyhow::Error) -> AdTrackError {
    AdTrackError::database_operation(format!("metrics query failed: {:#}", e))
}

/// 参考时区；越界的偏移回退到 UTC
pub fn reference_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

enum Bound {
    From,
    To,
}

fn parse_bound(s: &str, bound: Bound, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        let dt = dt.with_timezone(&Utc);
        return Ok(match bound {
            Bound::From => dt,
            // 时刻形式的上界是闭区间，换算成开区间
            Bound::To => dt + Duration::nanoseconds(1),
        });
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        AdTrackError::aggregation_query(format!(
            "Invalid date '{}'. Supported formats: RFC3339 or YYYY-MM-DD",
            s
        ))
    })?;
    let day = match bound {
        Bound::From => date,
        Bound::To => date.succ_opt().unwrap_or(date),
    };
    Ok(crate::analytics::timeseries::start_of_day(day, offset))
}

pub fn parse_date_range(
    from: Option<&str>,
    to: Option<&str>,
    offset: FixedOffset,
) -> Result<DateRange> {
    let from = from
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_bound(s, Bound::From, offset))
        .transpose()?;
    let to = to
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_bound(s, Bound::To, offset))
        .transpose()?;

    if let (Some(f), Some(t)) = (from, to)
        && f >= t
    {
        return Err(AdTrackError::aggregation_query(
            "'from' must not be later than 'to'",
        ));
    }
    Ok(DateRange { from, to })
}
