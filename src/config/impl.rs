use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn cell() -> &'static ArcSwap<StaticConfig> {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
}

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to defaults when nothing has
/// been loaded yet.
pub fn get_config() -> Arc<StaticConfig> {
    cell().load_full()
}

/// Initialize the global configuration from a TOML file (plus `AT__*` env overrides)
///
/// If the file doesn't exist, uses in-memory defaults.
///
/// # Examples
/// ```no_run
/// use adtrack::config::init_config;
/// init_config("config.toml");
/// ```
pub fn init_config(path: &str) {
    let loaded = StaticConfig::load(path);
    cell().store(Arc::new(loaded));
}

/// Install an already-built configuration (used by tests and embedders)
pub fn init_config_with(config: StaticConfig) {
    cell().store(Arc::new(config));
}
