//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_cors::Cors;
use actix_web::{
    App, HttpServer,
    middleware::{Compress, Condition, DefaultHeaders},
    web,
};
use anyhow::{Context, Result};
use tracing::warn;

use crate::api::middleware::{AdminAuth, TimingMiddleware};
use crate::api::services::admin::routes::admin_v1_routes;
use crate::api::services::{ads_routes, health_routes, track_routes, tracking_rate_limiter};
use crate::config::{ApiConfig, get_config};
use crate::runtime::lifetime;
use crate::runtime::lifetime::startup::{AppState, RouteConfig};

/// 请求体上限
const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Validate CORS configuration at startup (runs once)
fn validate_cors_config(api: &ApiConfig) {
    if api.cors_allowed_origins.is_empty() {
        warn!(
            "CORS allowed_origins is empty: tracking endpoints accept same-origin requests only. \
            Set api.cors_allowed_origins to the journal site origin(s) if it is served elsewhere."
        );
    } else if api.cors_allowed_origins.iter().any(|o| o == "*") {
        warn!("CORS allows any origin on tracking endpoints");
    }
}

/// Build CORS middleware for the public tracking scope
fn build_cors_middleware(origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_header(actix_web::http::header::CONTENT_TYPE)
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

/// 注册共享服务与全部路由
///
/// `rate_limited` 为 false 时不挂载限流器（测试请求没有对端地址）。
pub fn configure_app(
    cfg: &mut web::ServiceConfig,
    state: &AppState,
    routes: &RouteConfig,
    api: &ApiConfig,
    rate_limited: bool,
) {
    cfg.app_data(web::Data::new(state.storage.clone()))
        .app_data(web::Data::new(state.ingestion_service.clone()))
        .app_data(web::Data::new(state.metrics_service.clone()))
        .app_data(web::Data::new(state.publisher.clone()))
        .app_data(web::Data::new(state.start_time.clone()))
        .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
        .service(
            web::scope(&routes.admin_prefix)
                .wrap(AdminAuth::new(&api.admin_token))
                .service(admin_v1_routes()),
        )
        .service(web::scope(&routes.health_prefix).service(health_routes()))
        .service(
            web::scope(&routes.api_prefix)
                .wrap(build_cors_middleware(&api.cors_allowed_origins))
                .service(ads_routes())
                .service(
                    track_routes().wrap(Condition::new(rate_limited, tracking_rate_limiter(api))),
                ),
        );
}

/// Run the HTTP server
///
/// This function:
/// 1. Prepares server components (storage, services, routes)
/// 2. Configures and starts the HTTP server
/// 3. Listens for graceful shutdown signals
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let state = startup.state;
    let routes = startup.route_config;
    let config = get_config();
    let api = config.api.clone();

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    validate_cors_config(&api);

    let storage_for_shutdown = state.storage.clone();
    let publisher_for_shutdown = state.publisher.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware) // 最外层，记录请求延迟
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .configure(|cfg| configure_app(cfg, &state, &routes, &api, true))
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    // SSE 长连接不会主动结束，优雅停机只等待有限时间
    .shutdown_timeout(5)
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .disable_signals()
        .run();
    let handle = server.handle();

    // Wait for server or shutdown signal
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::wait_for_signal() => {
            handle.stop(true).await;
        }
    }

    lifetime::shutdown::perform_shutdown(storage_for_shutdown, publisher_for_shutdown).await;
    warn!("Graceful shutdown: all tasks completed");
    Ok(())
}
