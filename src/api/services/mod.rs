pub mod admin;
pub mod health;
pub mod tracking;

pub use health::{AppStartTime, HealthService, health_routes};
pub use tracking::{ads_routes, track_json_config, track_routes, tracking_rate_limiter};
