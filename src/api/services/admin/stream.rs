//! 实时指标推送端点（Server-Sent Events）

use std::sync::Arc;

use actix_web::http::header::ContentEncoding;
use actix_web::{HttpResponse, Responder, web};
use futures_util::StreamExt;

use crate::services::RealtimePublisher;

/// GET /v1/analytics/stream
///
/// 连接保持期间按固定间隔推送 `data: <json>\n\n` 帧；客户端断开后
/// 响应流被丢弃，订阅随之注销。
///
/// 显式声明 `identity` 编码，`Compress` 中间件才不会缓冲小帧。
pub async fn stream_metrics(publisher: web::Data<Arc<RealtimePublisher>>) -> impl Responder {
    let frames = publisher
        .subscribe()
        .map(|frame| frame.map_err(actix_web::error::ErrorInternalServerError));

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .insert_header(ContentEncoding::Identity)
        .streaming(frames)
}
