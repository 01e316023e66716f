//! 单次挂载的可见性状态机
//!
//! 纯逻辑，不持有定时器。调用方按返回的 `TimerCommand` 自行布置或取消定时器。

use std::time::Duration;

use tokio::time::Instant;

use crate::config::TrackingConfig;

/// 触发阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// 曝光所需的最小可见比例
    pub impression_ratio: f64,
    /// 有效浏览所需的最小可见比例
    pub view_ratio: f64,
    /// 有效浏览所需的连续可见时长
    pub view_threshold: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            impression_ratio: 0.01,
            view_ratio: 0.5,
            view_threshold: Duration::from_millis(1000),
        }
    }
}

impl From<&TrackingConfig> for Thresholds {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            impression_ratio: config.impression_ratio,
            view_ratio: config.view_ratio,
            view_threshold: Duration::from_millis(config.view_threshold_ms),
        }
    }
}

/// 需要上报的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Impression,
    View { duration: Duration },
}

/// 定时器指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Keep,
    Arm(Duration),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub signals: Vec<Signal>,
    pub timer: TimerCommand,
}

impl Transition {
    fn keep(signals: Vec<Signal>) -> Self {
        Self {
            signals,
            timer: TimerCommand::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewPhase {
    Idle,
    Timing { since: Instant },
    Sent,
}

#[derive(Debug, Clone)]
pub struct EngagementState {
    thresholds: Thresholds,
    impression_sent: bool,
    view: ViewPhase,
}

impl EngagementState {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            impression_sent: false,
            view: ViewPhase::Idle,
        }
    }

    pub fn impression_sent(&self) -> bool {
        self.impression_sent
    }

    pub fn view_sent(&self) -> bool {
        self.view == ViewPhase::Sent
    }

    pub fn is_timing(&self) -> bool {
        matches!(self.view, ViewPhase::Timing { .. })
    }

    /// 可见比例变化
    pub fn on_visibility(&mut self, ratio: f64, now: Instant) -> Transition {
        let mut signals = Vec::new();

        if !self.impression_sent && ratio > 0.0 && ratio >= self.thresholds.impression_ratio {
            self.impression_sent = true;
            signals.push(Signal::Impression);
        }

        let visible = ratio >= self.thresholds.view_ratio;
        let timer = match self.view {
            ViewPhase::Sent => TimerCommand::Keep,
            ViewPhase::Idle if visible => {
                self.view = ViewPhase::Timing { since: now };
                TimerCommand::Arm(self.thresholds.view_threshold)
            }
            ViewPhase::Idle => TimerCommand::Keep,
            ViewPhase::Timing { .. } if visible => TimerCommand::Keep,
            ViewPhase::Timing { since } => {
                let elapsed = now.saturating_duration_since(since);
                if elapsed >= self.thresholds.view_threshold {
                    // 定时器尚未执行，但条件已满足
                    self.view = ViewPhase::Sent;
                    signals.push(Signal::View { duration: elapsed });
                } else {
                    self.view = ViewPhase::Idle;
                }
                TimerCommand::Cancel
            }
        };

        Transition { signals, timer }
    }

    /// 浏览定时器到期
    pub fn on_timer(&mut self, now: Instant) -> Transition {
        match self.view {
            ViewPhase::Timing { since } => {
                let elapsed = now.saturating_duration_since(since);
                if elapsed >= self.thresholds.view_threshold {
                    self.view = ViewPhase::Sent;
                    Transition {
                        signals: vec![Signal::View { duration: elapsed }],
                        timer: TimerCommand::Cancel,
                    }
                } else {
                    Transition {
                        signals: Vec::new(),
                        timer: TimerCommand::Arm(self.thresholds.view_threshold - elapsed),
                    }
                }
            }
            _ => Transition::keep(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn state() -> EngagementState {
        EngagementState::new(Thresholds::default())
    }

    #[test]
    fn impression_fires_once_across_reentries() {
        let mut s = state();
        let t0 = Instant::now();
        let mut impressions = 0;
        for (i, ratio) in [0.0, 0.02, 0.0, 0.3, 0.0, 0.02, 0.0].iter().enumerate() {
            let tr = s.on_visibility(*ratio, t0 + ms(i as u64 * 10));
            impressions += tr
                .signals
                .iter()
                .filter(|sig| **sig == Signal::Impression)
                .count();
        }
        assert_eq!(impressions, 1);
        assert!(s.impression_sent());
    }

    #[test]
    fn below_impression_ratio_is_unseen() {
        let mut s = state();
        let tr = s.on_visibility(0.005, Instant::now());
        assert!(tr.signals.is_empty());
        assert!(!s.impression_sent());
    }

    #[test]
    fn half_visible_counts_as_impression_and_starts_timer() {
        let mut s = state();
        let tr = s.on_visibility(0.5, Instant::now());
        assert_eq!(tr.signals, vec![Signal::Impression]);
        assert_eq!(tr.timer, TimerCommand::Arm(ms(1000)));
        assert!(s.is_timing());
    }

    #[test]
    fn drop_before_threshold_cancels() {
        let mut s = state();
        let t0 = Instant::now();
        s.on_visibility(0.8, t0);
        let tr = s.on_visibility(0.4, t0 + ms(999));
        assert!(tr.signals.is_empty());
        assert_eq!(tr.timer, TimerCommand::Cancel);
        assert!(!s.is_timing());
        // 过期的定时器回调不应产生浏览
        assert!(s.on_timer(t0 + ms(1000)).signals.is_empty());
    }

    #[test]
    fn interrupted_intervals_do_not_accumulate() {
        let mut s = state();
        let t0 = Instant::now();
        s.on_visibility(0.9, t0);
        s.on_visibility(0.1, t0 + ms(700));
        let tr = s.on_visibility(0.9, t0 + ms(800));
        assert_eq!(tr.timer, TimerCommand::Arm(ms(1000)));
        let tr = s.on_visibility(0.1, t0 + ms(1500));
        assert!(tr.signals.is_empty());
        assert!(!s.view_sent());
    }

    #[test]
    fn timer_fires_single_view_with_elapsed_duration() {
        let mut s = state();
        let t0 = Instant::now();
        s.on_visibility(0.6, t0);
        let tr = s.on_timer(t0 + ms(1000));
        assert_eq!(tr.signals, vec![Signal::View { duration: ms(1000) }]);
        assert!(s.view_sent());

        // 终态：再次可见或计时都不再触发
        s.on_visibility(0.0, t0 + ms(1200));
        let tr = s.on_visibility(1.0, t0 + ms(1300));
        assert!(tr.signals.is_empty());
        assert_eq!(tr.timer, TimerCommand::Keep);
        assert!(s.on_timer(t0 + ms(2300)).signals.is_empty());
    }

    #[test]
    fn early_timer_is_rearmed_for_remainder() {
        let mut s = state();
        let t0 = Instant::now();
        s.on_visibility(0.6, t0);
        let tr = s.on_timer(t0 + ms(400));
        assert!(tr.signals.is_empty());
        assert_eq!(tr.timer, TimerCommand::Arm(ms(600)));
    }

    #[test]
    fn late_visibility_drop_still_credits_view() {
        let mut s = state();
        let t0 = Instant::now();
        s.on_visibility(0.6, t0);
        let tr = s.on_visibility(0.2, t0 + ms(1250));
        assert_eq!(tr.signals, vec![Signal::View { duration: ms(1250) }]);
        assert!(s.view_sent());
    }
}
