//! Mode routing
//!
//! This module provides unified entry points for the execution modes:
//! - Server mode (HTTP server)
//! - CLI mode (Command-line interface)

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::{configure_app, run_server};

use crate::cli::Commands;

/// Mode detection result
#[derive(Debug, PartialEq)]
pub enum Mode {
    Server,
    Cli,
}

/// Detect which mode to run based on the parsed subcommand
///
/// No subcommand or `serve` runs the server; anything else is a one-shot CLI command.
pub fn detect_mode(command: Option<&Commands>) -> Mode {
    match command {
        None | Some(Commands::Serve) => Mode::Server,
        Some(_) => Mode::Cli,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::AdsCommands;

    #[test]
    fn serve_and_empty_select_server_mode() {
        assert_eq!(detect_mode(None), Mode::Server);
        assert_eq!(detect_mode(Some(&Commands::Serve)), Mode::Server);
        assert_eq!(
            detect_mode(Some(&Commands::Ads {
                action: AdsCommands::List
            })),
            Mode::Cli
        );
    }
}
