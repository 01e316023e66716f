//! 派生指标计算
//!
//! 所有比率在内部以完整精度计算，仅在输出时保留两位小数。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::TS_EXPORT_PATH;

/// 单个广告在统计范围内的原始计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdCounts {
    pub impressions: u64,
    pub views: u64,
    pub clicks: u64,
    pub total_view_duration_ms: u64,
    pub unique_visitors: u64,
}

fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64 * 100.0
    }
}

impl AdCounts {
    /// clicks / impressions * 100
    pub fn ctr(&self) -> f64 {
        percent(self.clicks, self.impressions)
    }

    /// views / impressions * 100
    pub fn viewability(&self) -> f64 {
        percent(self.views, self.impressions)
    }

    /// clicks / views * 100
    pub fn view_click_through_rate(&self) -> f64 {
        percent(self.clicks, self.views)
    }

    /// 平均有效浏览时长（秒）
    pub fn avg_view_duration_secs(&self) -> f64 {
        if self.views == 0 {
            0.0
        } else {
            self.total_view_duration_ms as f64 / self.views as f64 / 1000.0
        }
    }

    /// (views + clicks) / impressions * 100
    pub fn engagement_rate(&self) -> f64 {
        percent(self.views.saturating_add(self.clicks), self.impressions)
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 单广告指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct AdMetrics {
    pub ad_id: String,
    pub ad_name: String,
    pub placement: String,
    pub is_active: bool,
    #[ts(type = "number")]
    pub impressions: u64,
    #[ts(type = "number")]
    pub views: u64,
    #[ts(type = "number")]
    pub clicks: u64,
    #[ts(type = "number")]
    pub unique_visitors: u64,
    /// clicks / impressions，百分比，保留两位小数
    pub ctr: f64,
    /// views / impressions，百分比，保留两位小数
    pub viewability: f64,
    /// clicks / views，百分比，保留两位小数
    pub click_through_rate: f64,
    /// 平均有效浏览时长，单位秒，保留两位小数
    pub avg_view_duration: f64,
    /// (views + clicks) / impressions，百分比，保留两位小数
    pub engagement_rate: f64,
}

/// 汇总指标
///
/// 比率类字段为各广告比率的算术平均（每个广告等权），不是总数之比。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct OverallMetrics {
    #[ts(type = "number")]
    pub ad_count: u64,
    #[ts(type = "number")]
    pub total_impressions: u64,
    #[ts(type = "number")]
    pub total_views: u64,
    #[ts(type = "number")]
    pub total_clicks: u64,
    /// 百分比，保留两位小数
    pub avg_ctr: f64,
    pub avg_viewability: f64,
    pub avg_engagement_rate: f64,
}

/// 单广告指标（附带原始计数，供汇总使用完整精度）
#[derive(Debug, Clone)]
pub struct ScopedAd {
    pub ad_id: String,
    pub ad_name: String,
    pub placement: String,
    pub is_active: bool,
    pub counts: AdCounts,
}

pub fn compute_ad_metrics(ad: &ScopedAd) -> AdMetrics {
    let c = &ad.counts;
    AdMetrics {
        ad_id: ad.ad_id.clone(),
        ad_name: ad.ad_name.clone(),
        placement: ad.placement.clone(),
        is_active: ad.is_active,
        impressions: c.impressions,
        views: c.views,
        clicks: c.clicks,
        unique_visitors: c.unique_visitors,
        ctr: round2(c.ctr()),
        viewability: round2(c.viewability()),
        click_through_rate: round2(c.view_click_through_rate()),
        avg_view_duration: round2(c.avg_view_duration_secs()),
        engagement_rate: round2(c.engagement_rate()),
    }
}

pub fn compute_overall(ads: &[ScopedAd]) -> OverallMetrics {
    if ads.is_empty() {
        return OverallMetrics::default();
    }

    let n = ads.len() as f64;
    let mean = |f: fn(&AdCounts) -> f64| ads.iter().map(|a| f(&a.counts)).sum::<f64>() / n;

    OverallMetrics {
        ad_count: ads.len() as u64,
        total_impressions: ads.iter().map(|a| a.counts.impressions).sum(),
        total_views: ads.iter().map(|a| a.counts.views).sum(),
        total_clicks: ads.iter().map(|a| a.counts.clicks).sum(),
        avg_ctr: round2(mean(AdCounts::ctr)),
        avg_viewability: round2(mean(AdCounts::viewability)),
        avg_engagement_rate: round2(mean(AdCounts::engagement_rate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped(id: &str, counts: AdCounts) -> ScopedAd {
        ScopedAd {
            ad_id: id.to_string(),
            ad_name: format!("Ad {}", id),
            placement: "sidebar".to_string(),
            is_active: true,
            counts,
        }
    }

    #[test]
    fn reference_example() {
        let counts = AdCounts {
            impressions: 100,
            views: 40,
            clicks: 5,
            total_view_duration_ms: 40_000,
            unique_visitors: 30,
        };
        let m = compute_ad_metrics(&scoped("a", counts));
        assert_eq!(m.ctr, 5.00);
        assert_eq!(m.viewability, 40.00);
        assert_eq!(m.avg_view_duration, 1.00);
        assert_eq!(m.engagement_rate, 45.00);
        assert_eq!(m.click_through_rate, 12.5);
    }

    #[test]
    fn zero_impressions_and_views_are_guarded() {
        let m = compute_ad_metrics(&scoped("a", AdCounts::default()));
        assert_eq!(m.ctr, 0.0);
        assert_eq!(m.viewability, 0.0);
        assert_eq!(m.engagement_rate, 0.0);
        assert_eq!(m.avg_view_duration, 0.0);
        assert_eq!(m.click_through_rate, 0.0);

        // 只有点击没有曝光（例如曝光请求丢失）
        let clicks_only = AdCounts {
            clicks: 3,
            ..Default::default()
        };
        assert_eq!(clicks_only.ctr(), 0.0);
        assert_eq!(clicks_only.view_click_through_rate(), 0.0);
    }

    #[test]
    fn rounding_applies_only_to_output() {
        let counts = AdCounts {
            impressions: 3,
            views: 1,
            clicks: 1,
            total_view_duration_ms: 1234,
            unique_visitors: 3,
        };
        let m = compute_ad_metrics(&scoped("a", counts));
        assert_eq!(m.ctr, 33.33);
        assert_eq!(m.engagement_rate, 66.67);
        assert_eq!(m.avg_view_duration, 1.23);
    }

    #[test]
    fn overall_is_mean_of_ratios() {
        let busy = AdCounts {
            impressions: 1000,
            clicks: 10,
            views: 500,
            ..Default::default()
        };
        let quiet = AdCounts {
            impressions: 10,
            clicks: 5,
            views: 10,
            ..Default::default()
        };
        let overall = compute_overall(&[scoped("a", busy), scoped("b", quiet)]);
        assert_eq!(overall.ad_count, 2);
        assert_eq!(overall.total_impressions, 1010);
        assert_eq!(overall.total_clicks, 15);
        // (1% + 50%) / 2，而不是 15 / 1010
        assert_eq!(overall.avg_ctr, 25.5);
        assert_eq!(overall.avg_viewability, 75.0);
        assert_eq!(overall.avg_engagement_rate, 100.5);
    }

    #[test]
    fn overall_uses_unrounded_per_ad_ratios() {
        let low = AdCounts {
            impressions: 1_000_000,
            clicks: 49,
            ..Default::default()
        };
        let high = AdCounts {
            impressions: 1_000_000,
            clicks: 149,
            ..Default::default()
        };
        // 0.0049 / 0.0149 分别舍入为 0.00 / 0.01，先舍入再平均会得到 0.00
        let ads = vec![
            scoped("a", low),
            scoped("b", low),
            scoped("c", low),
            scoped("d", high),
        ];
        assert_eq!(compute_overall(&ads).avg_ctr, 0.01);
    }

    #[test]
    fn overall_with_no_ads_is_all_zero() {
        assert_eq!(compute_overall(&[]), OverallMetrics::default());
    }
}
