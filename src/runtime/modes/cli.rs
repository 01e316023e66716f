//! CLI mode
//!
//! Delegates to the actual CLI implementation.

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

/// Run CLI mode
pub async fn run_cli(command: Commands) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(command).await
}
