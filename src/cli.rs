//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for adtrack using clap's derive macros.

use clap::{Parser, Subcommand};

/// adtrack - Advertisement engagement tracking service
#[derive(Parser, Debug)]
#[command(name = "adtrack")]
#[command(version)]
#[command(about = "Advertisement engagement tracking and analytics service", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default when no command is given)
    Serve,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Manage advertisements
    Ads {
        #[command(subcommand)]
        action: AdsCommands,
    },

    /// Print analytics reports as JSON
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Advertisement commands
#[derive(Subcommand, Debug)]
pub enum AdsCommands {
    /// Register an advertisement
    Add {
        /// Advertisement id
        id: String,

        /// Display name
        name: String,

        /// Placement slot (sidebar, header, article-top, article-bottom, footer)
        #[arg(long)]
        placement: String,

        /// Creative image URL
        #[arg(long, default_value = "")]
        image_url: String,

        /// Destination URL opened on click
        #[arg(long, default_value = "")]
        target_url: String,

        /// End of the campaign (RFC3339)
        #[arg(long)]
        end_date: Option<String>,

        /// Register as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// List all advertisements
    List,
}

/// Report commands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Per-ad and overall metrics
    Metrics {
        /// Restrict to one advertisement
        #[arg(long)]
        ad: Option<String>,

        /// Range start (RFC3339 or YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Range end (RFC3339 or YYYY-MM-DD, inclusive day)
        #[arg(long)]
        to: Option<String>,
    },

    /// Daily trend
    Trend {
        /// Restrict to one advertisement
        #[arg(long)]
        ad: Option<String>,

        /// Number of days including today
        #[arg(long, default_value_t = crate::services::DEFAULT_TIMESERIES_DAYS)]
        days: u32,
    },
}
