use super::EngagementEvent;
use crate::storage::models::{Advertisement, Placement};

/// 互动事件写入 Sink（追加写，不更新、不删除）
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// 记录单条事件
    async fn record_event(&self, event: EngagementEvent) -> anyhow::Result<()>;
}

/// 广告目录（由运营侧维护，对采集链路只读）
#[async_trait::async_trait]
pub trait AdDirectory: Send + Sync {
    /// 广告是否存在（不区分启用状态）
    async fn ad_exists(&self, ad_id: &str) -> anyhow::Result<bool>;

    /// 指定位置当前可投放的广告
    async fn list_active_ads(&self, placement: Placement) -> anyhow::Result<Vec<Advertisement>>;
}
