//! CLI command implementations

mod ads;
mod config_gen;
mod report;

pub use ads::{add_ad, list_ads};
pub use config_gen::config_generate;
pub use report::{report_metrics, report_trend};
