use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::services::RealtimePublisher;
use crate::storage::SeaOrmStorage;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// 等待 Ctrl+C 信号
pub async fn wait_for_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping server...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }
}

/// HTTP 服务停止后释放资源
pub async fn perform_shutdown(storage: Arc<SeaOrmStorage>, publisher: Arc<RealtimePublisher>) {
    let open_streams = publisher.active_subscribers();
    if open_streams > 0 {
        warn!("{} realtime subscribers still registered at shutdown", open_streams);
    }

    // 事件同步落库，没有待刷新的缓冲，只需关闭连接池
    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), storage.close()).await {
        Ok(()) => {
            info!("All shutdown tasks completed successfully");
        }
        Err(_) => {
            error!(
                "Shutdown tasks timed out after {} seconds",
                SHUTDOWN_TIMEOUT_SECS
            );
        }
    }
}
