use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量
/// - database: 事件存储连接配置
/// - logging: 日志配置
/// - routes: 路由前缀
/// - api: 管理端鉴权、CORS、限流
/// - tracking: 采集端阈值与去重窗口
/// - stream: 实时推送节奏
/// - analytics: 聚合参考时区等
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：AT，分隔符：__
    /// 示例：AT__SERVER__PORT=9999
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("AT")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// text 或 json
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 路由前缀配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_health_prefix")]
    pub health_prefix: String,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 管理端 Bearer Token，为空时不校验
    #[serde(default)]
    pub admin_token: String,
    /// 允许跨域上报的来源（期刊站点域名）
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    /// 上报接口每秒补充的令牌数
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: u64,
    /// 上报接口突发上限
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
}

/// 采集配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// 服务端去重窗口（秒），0 表示关闭
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: u64,
    #[serde(default = "default_max_page_length")]
    pub max_page_length: usize,
    /// 曝光阈值（可见面积比例）
    #[serde(default = "default_impression_ratio")]
    pub impression_ratio: f64,
    /// 有效浏览阈值（可见面积比例）
    #[serde(default = "default_view_ratio")]
    pub view_ratio: f64,
    /// 有效浏览需要连续可见的毫秒数
    #[serde(default = "default_view_threshold_ms")]
    pub view_threshold_ms: u64,
}

/// 实时推送配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_stream_window_hours")]
    pub window_hours: u64,
}

/// 聚合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 按天分桶使用的参考时区（相对 UTC 的分钟偏移）
    #[serde(default)]
    pub timezone_offset_minutes: i32,
    #[serde(default = "default_max_timeseries_days")]
    pub max_timeseries_days: u32,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "adtrack.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_health_prefix() -> String {
    "/health".to_string()
}

fn default_rate_limit_per_second() -> u64 {
    20
}

fn default_rate_limit_burst() -> u32 {
    60
}

fn default_dedup_window_secs() -> u64 {
    10
}

fn default_dedup_capacity() -> u64 {
    100_000
}

fn default_max_page_length() -> usize {
    2048
}

fn default_impression_ratio() -> f64 {
    0.01
}

fn default_view_ratio() -> f64 {
    0.5
}

fn default_view_threshold_ms() -> u64 {
    1000
}

fn default_stream_interval_secs() -> u64 {
    5
}

fn default_stream_window_hours() -> u64 {
    24
}

fn default_max_timeseries_days() -> u32 {
    366
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            admin_prefix: default_admin_prefix(),
            health_prefix: default_health_prefix(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            admin_token: String::new(),
            cors_allowed_origins: Vec::new(),
            rate_limit_per_second: default_rate_limit_per_second(),
            rate_limit_burst: default_rate_limit_burst(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: default_dedup_window_secs(),
            dedup_capacity: default_dedup_capacity(),
            max_page_length: default_max_page_length(),
            impression_ratio: default_impression_ratio(),
            view_ratio: default_view_ratio(),
            view_threshold_ms: default_view_threshold_ms(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_stream_interval_secs(),
            window_hours: default_stream_window_hours(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: 0,
            max_timeseries_days: default_max_timeseries_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_measurement_contract() {
        let config = StaticConfig::default();
        assert_eq!(config.tracking.impression_ratio, 0.01);
        assert_eq!(config.tracking.view_ratio, 0.5);
        assert_eq!(config.tracking.view_threshold_ms, 1000);
        assert_eq!(config.stream.interval_secs, 5);
        assert_eq!(config.stream.window_hours, 24);
        assert_eq!(config.analytics.timezone_offset_minutes, 0);
    }

    #[test]
    fn sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[tracking]"));
        let parsed: StaticConfig = toml::from_str(&sample).expect("sample config must parse");
        assert_eq!(parsed.routes.admin_prefix, "/admin");
        assert_eq!(parsed.database.database_url, "adtrack.db");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [tracking]
            dedup_window_secs = 0
            "#,
        )
        .expect("partial config must parse");
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.server.host, "127.0.0.1");
        assert_eq!(parsed.tracking.dedup_window_secs, 0);
        assert_eq!(parsed.tracking.view_threshold_ms, 1000);
    }
}
