//! 按天分桶
//!
//! 日期边界以参考时区（固定偏移）的零点为准。窗口内没有事件的日期同样输出，
//! 计数为 0，保证调用方总是拿到 `days` 个按日期升序排列的桶。

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::metrics::round2;
use super::{EventKind, TS_EXPORT_PATH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = TS_EXPORT_PATH)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    /// YYYY-MM-DD（参考时区）
    pub date: String,
    #[ts(type = "number")]
    pub impressions: u64,
    #[ts(type = "number")]
    pub views: u64,
    #[ts(type = "number")]
    pub clicks: u64,
    pub ctr: f64,
}

/// 参考时区下某天零点对应的 UTC 时刻
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        // 固定偏移不存在歧义，这里只是兜底
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// 参考时区下的"今天"
pub fn today_in(offset: FixedOffset, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// 窗口的起止（左闭右开）：[today - days + 1 的零点, 明天零点)
pub fn window_bounds(
    today: NaiveDate,
    days: u32,
    offset: FixedOffset,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = today
        .checked_sub_days(Days::new(days.saturating_sub(1) as u64))
        .unwrap_or(NaiveDate::MIN);
    let after_last = today.succ_opt().unwrap_or(today);
    (start_of_day(first, offset), start_of_day(after_last, offset))
}

/// 将事件时间戳归入每日桶
///
/// 窗口外的事件被忽略。
pub fn bucket_daily(
    events: &[(EventKind, DateTime<Utc>)],
    today: NaiveDate,
    days: u32,
    offset: FixedOffset,
) -> Vec<DailyBucket> {
    if days == 0 {
        return Vec::new();
    }

    let first = today
        .checked_sub_days(Days::new(days as u64 - 1))
        .unwrap_or(NaiveDate::MIN);

    let mut counts = vec![(0u64, 0u64, 0u64); days as usize];
    for (kind, ts) in events {
        let local = ts.with_timezone(&offset).date_naive();
        let index = (local - first).num_days();
        if index < 0 || index >= days as i64 {
            continue;
        }
        let slot = &mut counts[index as usize];
        match kind {
            EventKind::Impression => slot.0 += 1,
            EventKind::View => slot.1 += 1,
            EventKind::Click => slot.2 += 1,
        }
    }

    first
        .iter_days()
        .zip(counts)
        .map(|(date, (impressions, views, clicks))| DailyBucket {
            date: date.format("%Y-%m-%d").to_string(),
            impressions,
            views,
            clicks,
            ctr: if impressions > 0 {
                round2(clicks as f64 / impressions as f64 * 100.0)
            } else {
                0.0
            },
        })
        .collect()
}
