//! 聚合相关的数据库查询
//!
//! 只读。按广告分组的计数在 SQL 中完成；独立访客需要跨三张表取并集，
//! 因此返回去重后的 (ad_id, session_id) 对，由服务层合并。

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QuerySelect, sea_query::Expr,
};

use super::{EventFilter, SeaOrmStorage};
use crate::analytics::EventKind;

use migration::entities::{ad_click, ad_impression, ad_view};

/// 按广告分组的计数行
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct AdEventCounts {
    pub ad_id: String,
    pub count: i64,
}

/// 按广告分组的浏览汇总行
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ViewTotals {
    pub ad_id: String,
    pub count: i64,
    pub total_duration: Option<i64>,
}

/// 对事件表套用广告与时间范围过滤
macro_rules! scoped_find {
    ($table:ident, $filter:expr) => {{
        let filter: &EventFilter = $filter;
        let mut select = $table::Entity::find();
        if let Some(ad_id) = &filter.ad_id {
            select = select.filter($table::Column::AdId.eq(ad_id.as_str()));
        }
        if let Some(from) = filter.from {
            select = select.filter($table::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            select = select.filter($table::Column::CreatedAt.lt(to));
        }
        select
    }};
}

macro_rules! count_by_ad {
    ($table:ident, $filter:expr, $db:expr) => {
        scoped_find!($table, $filter)
            .select_only()
            .column($table::Column::AdId)
            .column_as($table::Column::Id.count(), "count")
            .group_by($table::Column::AdId)
            .into_model::<AdEventCounts>()
            .all($db)
            .await
    };
}

macro_rules! distinct_sessions {
    ($table:ident, $filter:expr, $db:expr) => {
        scoped_find!($table, $filter)
            .select_only()
            .column($table::Column::AdId)
            .column($table::Column::SessionId)
            .distinct()
            .into_tuple::<(String, String)>()
            .all($db)
            .await
    };
}

macro_rules! timestamps {
    ($table:ident, $filter:expr, $db:expr) => {
        scoped_find!($table, $filter)
            .select_only()
            .column($table::Column::CreatedAt)
            .into_tuple::<DateTime<Utc>>()
            .all($db)
            .await
    };
}

impl SeaOrmStorage {
    /// 曝光或点击的按广告计数
    pub async fn count_events_by_ad(
        &self,
        kind: EventKind,
        filter: &EventFilter,
    ) -> anyhow::Result<Vec<AdEventCounts>> {
        let rows = match kind {
            EventKind::Impression => count_by_ad!(ad_impression, filter, &self.db),
            EventKind::Click => count_by_ad!(ad_click, filter, &self.db),
            EventKind::View => {
                return Ok(self
                    .view_totals_by_ad(filter)
                    .await?
                    .into_iter()
                    .map(|v| AdEventCounts {
                        ad_id: v.ad_id,
                        count: v.count,
                    })
                    .collect());
            }
        };
        rows.with_context(|| format!("failed to count {} events", kind))
    }

    /// 浏览次数与时长合计
    pub async fn view_totals_by_ad(&self, filter: &EventFilter) -> anyhow::Result<Vec<ViewTotals>> {
        // PostgreSQL 的 SUM(bigint) 返回 numeric，MySQL 返回 decimal，统一转回整数
        let int_type = if self.backend_name == "mysql" {
            "SIGNED"
        } else {
            "BIGINT"
        };
        let total = Expr::cust(format!("CAST(SUM(view_duration) AS {})", int_type));

        scoped_find!(ad_view, filter)
            .select_only()
            .column(ad_view::Column::AdId)
            .column_as(ad_view::Column::Id.count(), "count")
            .column_as(total, "total_duration")
            .group_by(ad_view::Column::AdId)
            .into_model::<ViewTotals>()
            .all(&self.db)
            .await
            .context("failed to aggregate view durations")
    }

    /// 去重后的 (ad_id, session_id)
    pub async fn distinct_sessions(
        &self,
        kind: EventKind,
        filter: &EventFilter,
    ) -> anyhow::Result<Vec<(String, String)>> {
        match kind {
            EventKind::Impression => distinct_sessions!(ad_impression, filter, &self.db),
            EventKind::View => distinct_sessions!(ad_view, filter, &self.db),
            EventKind::Click => distinct_sessions!(ad_click, filter, &self.db),
        }
        .with_context(|| format!("failed to load {} sessions", kind))
    }

    /// 范围内事件的时间戳（按天分桶使用）
    pub async fn event_timestamps(
        &self,
        kind: EventKind,
        filter: &EventFilter,
    ) -> anyhow::Result<Vec<DateTime<Utc>>> {
        match kind {
            EventKind::Impression => timestamps!(ad_impression, filter, &self.db),
            EventKind::View => timestamps!(ad_view, filter, &self.db),
            EventKind::Click => timestamps!(ad_click, filter, &self.db),
        }
        .with_context(|| format!("failed to load {} timestamps", kind))
    }
}
