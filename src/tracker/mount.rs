//! 单个已挂载广告的采集驱动
//!
//! 持有状态机、可取消的浏览定时器和上报通道。上报失败只记录日志，
//! 不重试，也不向调用方返回错误。

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::state::{EngagementState, Signal, Thresholds, TimerCommand, Transition};
use super::transport::EventTransport;
use crate::analytics::{EventKind, TrackEventPayload};

/// 广告实例的上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdContext {
    pub ad_id: String,
    pub target_url: String,
    pub page: String,
}

/// 用户激活方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Pointer,
    /// 键盘按键（`Enter`、`Space` 或 `" "` 才算激活）
    Key(String),
}

impl Activation {
    pub fn activates(&self) -> bool {
        match self {
            Activation::Pointer => true,
            Activation::Key(key) => matches!(key.as_str(), "Enter" | " " | "Space" | "Spacebar"),
        }
    }
}

/// 点击后打开目标地址的方式：新窗口且不暴露 opener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationIntent {
    pub url: String,
    pub target: String,
    pub rel: String,
}

impl NavigationIntent {
    pub fn new_context(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: "_blank".to_string(),
            rel: "noopener noreferrer".to_string(),
        }
    }
}

struct Inner {
    ad: AdContext,
    session_id: String,
    state: Mutex<EngagementState>,
    timer: Mutex<Option<JoinHandle<()>>>,
    transport: Arc<dyn EventTransport>,
}

pub struct MountedAd {
    inner: Arc<Inner>,
}

impl MountedAd {
    pub fn mount(
        ad: AdContext,
        session_id: impl Into<String>,
        thresholds: Thresholds,
        transport: Arc<dyn EventTransport>,
    ) -> Self {
        debug!("Ad {} mounted on {}", ad.ad_id, ad.page);
        Self {
            inner: Arc::new(Inner {
                ad,
                session_id: session_id.into(),
                state: Mutex::new(EngagementState::new(thresholds)),
                timer: Mutex::new(None),
                transport,
            }),
        }
    }

    pub fn ad(&self) -> &AdContext {
        &self.inner.ad
    }

    pub fn impression_sent(&self) -> bool {
        self.inner.state.lock().impression_sent()
    }

    pub fn view_sent(&self) -> bool {
        self.inner.state.lock().view_sent()
    }

    /// 是否有待执行的浏览定时器
    pub fn timer_pending(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// 可见比例变化（0.0 ..= 1.0）
    pub async fn on_visibility_change(&self, ratio: f64) {
        let transition = self.inner.state.lock().on_visibility(ratio, Instant::now());
        Inner::apply(&self.inner, transition).await;
    }

    /// 用户激活广告。记录点击并返回导航意图；非激活按键返回 None。
    pub async fn activate(&self, activation: Activation) -> Option<NavigationIntent> {
        if !activation.activates() {
            return None;
        }
        self.inner.dispatch(EventKind::Click, None).await;
        Some(NavigationIntent::new_context(self.inner.ad.target_url.clone()))
    }

    /// 卸载：取消挂起的定时器
    pub fn unmount(self) {}
}

impl Drop for MountedAd {
    fn drop(&mut self) {
        if let Some(handle) = self.inner.timer.lock().take() {
            handle.abort();
        }
        debug!("Ad {} unmounted", self.inner.ad.ad_id);
    }
}

impl Inner {
    async fn apply(this: &Arc<Inner>, transition: Transition) {
        match transition.timer {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => {
                if let Some(handle) = this.timer.lock().take() {
                    handle.abort();
                }
            }
            TimerCommand::Arm(delay) => Self::arm(this, delay),
        }

        for signal in transition.signals {
            match signal {
                Signal::Impression => this.dispatch(EventKind::Impression, None).await,
                Signal::View { duration } => this.dispatch(EventKind::View, Some(duration)).await,
            }
        }
    }

    fn arm(this: &Arc<Inner>, delay: Duration) {
        let inner = this.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let transition = inner.state.lock().on_timer(Instant::now());
            let rearm = match transition.timer {
                TimerCommand::Arm(rest) => Some(rest),
                _ => None,
            };
            for signal in transition.signals {
                if let Signal::View { duration } = signal {
                    inner.dispatch(EventKind::View, Some(duration)).await;
                }
            }
            // 替换掉的旧句柄就是本任务，此后不再有 await 点
            if let Some(rest) = rearm {
                Self::arm(&inner, rest);
            }
        });

        if let Some(previous) = this.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    async fn dispatch(&self, kind: EventKind, view_duration: Option<Duration>) {
        let mut payload = TrackEventPayload::new(
            self.ad.ad_id.clone(),
            self.session_id.clone(),
            self.ad.page.clone(),
        );
        if let Some(duration) = view_duration {
            payload = payload.with_view_duration(duration.as_millis().min(u64::MAX as u128) as u64);
        }

        if let Err(e) = self.transport.send(kind, payload).await {
            warn!(
                "Failed to report {} for ad {}: {:#}",
                kind, self.ad.ad_id, e
            );
        }
    }
}
