//! CLI interface module
//!
//! This module provides command-line interface functionality for adtrack.

pub mod commands;

use crate::cli::{AdsCommands, Commands, ConfigCommands, ReportCommands};
use crate::storage::StorageFactory;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::AdTrackError> for CliError {
    fn from(err: crate::errors::AdTrackError) -> Self {
        if err.is_client_error() {
            CliError::ParseError(err.to_string())
        } else {
            CliError::StorageError(err.to_string())
        }
    }
}

/// Run a CLI command from clap-parsed input
///
/// `Serve` is handled by the runtime before reaching here.
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        // Generate doesn't need DB connection
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => commands::config_generate(output_path, force).await,
        Commands::Ads { action } => {
            let storage = StorageFactory::create().await?;
            let result = match action {
                AdsCommands::Add {
                    id,
                    name,
                    placement,
                    image_url,
                    target_url,
                    end_date,
                    inactive,
                } => {
                    commands::add_ad(
                        storage.clone(),
                        id,
                        name,
                        placement,
                        image_url,
                        target_url,
                        end_date,
                        inactive,
                    )
                    .await
                }
                AdsCommands::List => commands::list_ads(storage.clone()).await,
            };
            storage.close().await;
            result
        }
        Commands::Report { action } => {
            let storage = StorageFactory::create().await?;
            let result = match action {
                ReportCommands::Metrics { ad, from, to } => {
                    commands::report_metrics(storage.clone(), ad, from, to).await
                }
                ReportCommands::Trend { ad, days } => {
                    commands::report_trend(storage.clone(), ad, days).await
                }
            };
            storage.close().await;
            result
        }
        Commands::Serve => Err(CliError::CommandError(
            "serve is handled by the server runtime".to_string(),
        )),
    }
}
