//! Advertisement commands

use chrono::{DateTime, Utc};
use colored::Colorize;
use std::str::FromStr;
use std::sync::Arc;

use crate::interfaces::cli::CliError;
use crate::storage::{NewAdvertisement, Placement, SeaOrmStorage};

#[allow(clippy::too_many_arguments)]
pub async fn add_ad(
    storage: Arc<SeaOrmStorage>,
    id: String,
    name: String,
    placement: String,
    image_url: String,
    target_url: String,
    end_date: Option<String>,
    inactive: bool,
) -> Result<(), CliError> {
    let placement = Placement::from_str(&placement).map_err(|_| {
        CliError::ParseError(format!(
            "Invalid placement '{}'. Valid: {}",
            placement,
            Placement::valid_values()
        ))
    })?;

    let mut ad = NewAdvertisement::new(id, name, placement).with_urls(image_url, target_url);
    if inactive {
        ad = ad.inactive();
    }
    if let Some(end) = end_date {
        let end = DateTime::parse_from_rfc3339(&end)
            .map_err(|e| CliError::ParseError(format!("Invalid end date '{}': {}", end, e)))?;
        ad = ad.ending_at(end.with_timezone(&Utc));
    }

    let created = storage
        .create_ad(ad)
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;

    println!(
        "{} Added advertisement: {} ({}) in {}",
        "✓".bold().green(),
        created.id.cyan(),
        created.name,
        created.placement.to_string().magenta()
    );
    Ok(())
}

pub async fn list_ads(storage: Arc<SeaOrmStorage>) -> Result<(), CliError> {
    let ads = storage
        .list_ads()
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;

    if ads.is_empty() {
        println!("{} No advertisements found", "ℹ".bold().blue());
        return Ok(());
    }

    let now = Utc::now();
    println!("{}", "Advertisements:".bold().green());
    for ad in &ads {
        let state = if ad.is_servable(now) {
            "serving".green()
        } else {
            "stopped".dimmed()
        };
        println!(
            "  {} {} [{}] {} -> {}",
            ad.id.cyan(),
            ad.name,
            ad.placement.to_string().magenta(),
            state,
            ad.target_url.blue().underline()
        );
    }
    println!(
        "{} Total {} advertisements",
        "ℹ".bold().blue(),
        ads.len().to_string().green()
    );
    Ok(())
}
