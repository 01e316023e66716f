//! 广告可见性采集
//!
//! 每个挂载的广告实例各自维护一份状态：曝光（≥1% 可见）至多一次，
//! 有效浏览（≥50% 连续可见 1 秒）至多一次，点击不限次数。

mod mount;
pub mod state;
mod transport;

pub use mount::{Activation, AdContext, MountedAd, NavigationIntent};
pub use state::{EngagementState, Signal, Thresholds, TimerCommand, Transition};
pub use transport::{EventTransport, HttpTransport};
