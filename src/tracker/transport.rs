//! 事件上报通道

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use tracing::trace;
use ureq::Agent;

use crate::analytics::{EventKind, TrackEventPayload};

const HTTP_TIMEOUT_SECS: u64 = 5;

#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn send(&self, kind: EventKind, payload: TrackEventPayload) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: EventTransport + ?Sized> EventTransport for Arc<T> {
    async fn send(&self, kind: EventKind, payload: TrackEventPayload) -> anyhow::Result<()> {
        (**self).send(kind, payload).await
    }
}

/// 通过 HTTP 上报到 `{base_url}/track/{kind}`
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    agent: Agent,
}

impl HttpTransport {
    /// `base_url` 形如 `https://journal.example.org/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn endpoint(&self, kind: EventKind) -> String {
        format!("{}/track/{}", self.base_url, kind)
    }

    fn post_sync(agent: Agent, url: String, payload: TrackEventPayload) -> anyhow::Result<()> {
        let resp = agent
            .post(&url)
            .send_json(&payload)
            .with_context(|| format!("POST {} failed", url))?;
        trace!("POST {} -> {}", url, resp.status());
        Ok(())
    }
}

#[async_trait]
impl EventTransport for HttpTransport {
    async fn send(&self, kind: EventKind, payload: TrackEventPayload) -> anyhow::Result<()> {
        let agent = self.agent.clone();
        let url = self.endpoint(kind);
        // ureq 是同步客户端，放到阻塞线程池执行
        tokio::task::spawn_blocking(move || Self::post_sync(agent, url, payload))
            .await
            .map_err(|e| anyhow!("transport task failed: {}", e))?
    }
}
