//! HTTP 接口层
//!
//! - `services::tracking`：公开采集端点（/track、/ads）
//! - `services::admin`：管理端分析端点（/v1/analytics）
//! - `services::health`：探针
//! - `middleware`：鉴权与请求耗时日志

pub mod middleware;
pub mod services;
