//! Admin API 服务模块
//!
//! 管理端（Dashboard）使用的只读分析端点：
//! - 指标查询与 CSV 导出
//! - 按天趋势
//! - 实时推送

pub mod analytics;
pub mod error_code;
mod helpers;
pub mod routes;
pub mod stream;
mod types;

// 重新导出类型
pub use types::*;

// 重新导出帮助函数
pub use helpers::{api_result, error_from_adtrack, error_response, json_response, success_response};

// 重新导出错误码
pub use error_code::ErrorCode;

pub use analytics::{export_metrics, get_metrics, get_time_series, render_metrics_csv};
pub use stream::stream_metrics;
