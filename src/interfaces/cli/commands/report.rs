//! Analytics reports (JSON on stdout)

use serde::Serialize;
use std::sync::Arc;

use crate::interfaces::cli::CliError;
use crate::services::MetricsService;
use crate::storage::SeaOrmStorage;

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::CommandError(format!("Failed to encode report: {}", e)))?;
    println!("{}", out);
    Ok(())
}

pub async fn report_metrics(
    storage: Arc<SeaOrmStorage>,
    ad: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<(), CliError> {
    let service = MetricsService::from_config(storage);
    let range = service.parse_date_range(from.as_deref(), to.as_deref())?;
    let report = service.compute_metrics(ad.as_deref(), range).await?;
    print_json(&report)
}

pub async fn report_trend(
    storage: Arc<SeaOrmStorage>,
    ad: Option<String>,
    days: u32,
) -> Result<(), CliError> {
    let service = MetricsService::from_config(storage);
    let buckets = service.compute_time_series(ad.as_deref(), days).await?;
    print_json(&buckets)
}
