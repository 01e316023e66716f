//! SeaORM storage backend
//!
//! Append-only engagement event storage plus the advertisement directory,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod ads;
mod analytics;
mod connection;
mod events;
pub mod retry;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::errors::{AdTrackError, Result};

pub use analytics::{AdEventCounts, ViewTotals};
pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(AdTrackError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// 事件查询范围
///
/// `from` 为闭区间，`to` 为开区间，均可省略。
#[derive(Default, Clone, Debug, PartialEq)]
pub struct EventFilter {
    pub ad_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn for_ad(ad_id: impl Into<String>) -> Self {
        Self {
            ad_id: Some(ad_id.into()),
            ..Default::default()
        }
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(AdTrackError::database_config(
                "database_url 未设置".to_string(),
            ));
        }

        let backend_name = normalize_backend_name(backend_name);

        // 读取重试配置
        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, &backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name,
            retry_config,
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        info!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 连通性检查（readiness 探针使用）
    pub async fn ping(&self) -> Result<()> {
        self.db
            .ping()
            .await
            .map_err(|e| AdTrackError::database_connection(e.to_string()))
    }

    /// 关闭连接池
    pub async fn close(&self) {
        if let Err(e) = self.db.clone().close().await {
            warn!("Failed to close database connection: {}", e);
        } else {
            info!("{} connection closed", self.backend_name.to_uppercase());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://x.db?mode=rwc").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("adtrack.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("mariadb://u@h/db").unwrap(), "mysql");
        assert_eq!(infer_backend_from_url("postgresql://u@h/db").unwrap(), "postgres");
        assert!(matches!(
            infer_backend_from_url("redis://localhost"),
            Err(AdTrackError::DatabaseConfig(_))
        ));
    }

    #[test]
    fn normalizes_mariadb() {
        assert_eq!(normalize_backend_name("mariadb"), "mysql");
        assert_eq!(normalize_backend_name("postgres"), "postgres");
    }
}
