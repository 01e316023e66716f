use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::api::services::AppStartTime;
use crate::config::get_config;
use crate::services::{IngestionService, MetricsService, RealtimePublisher, SnapshotSource};
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub state: AppState,
    pub route_config: RouteConfig,
}

/// 注入各 worker 的共享服务
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub ingestion_service: Arc<IngestionService>,
    pub metrics_service: Arc<MetricsService>,
    pub publisher: Arc<RealtimePublisher>,
    pub start_time: AppStartTime,
}

impl AppState {
    /// 由存储构建服务层（HTTP 与测试共用）
    pub fn from_storage(storage: Arc<SeaOrmStorage>) -> Self {
        let config = get_config();
        let ingestion_service = Arc::new(IngestionService::new(
            storage.clone(),
            storage.clone(),
            &config.tracking,
        ));
        let metrics_service = Arc::new(MetricsService::new(storage.clone(), &config.analytics));
        let source: Arc<dyn SnapshotSource> = metrics_service.clone();
        let publisher = Arc::new(RealtimePublisher::from_config(source, &config.stream));
        Self {
            storage,
            ingestion_service,
            metrics_service,
            publisher,
            start_time: AppStartTime::now(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub api_prefix: String,
    pub admin_prefix: String,
    pub health_prefix: String,
}

/// 准备服务器启动的上下文
/// 包括存储、服务层和路由配置
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    // 已安装时返回 Err，忽略即可
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    let config = get_config();
    if config.api.admin_token.is_empty() {
        warn!(
            "api.admin_token is empty: analytics endpoints under {} are NOT authenticated",
            config.routes.admin_prefix
        );
    }
    if config.tracking.dedup_window_secs == 0 {
        info!("Server-side dedup window disabled");
    }

    let state = AppState::from_storage(storage);

    let route_config = RouteConfig {
        api_prefix: config.routes.api_prefix.clone(),
        admin_prefix: config.routes.admin_prefix.clone(),
        health_prefix: config.routes.health_prefix.clone(),
    };

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        state,
        route_config,
    })
}
