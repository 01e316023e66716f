use clap::Parser;

use adtrack::cli::Cli;
use adtrack::config::{DEFAULT_CONFIG_PATH, get_config, init_config};
use adtrack::runtime::modes::{self, Mode};

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    init_config(&config_path);

    match modes::detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            // WorkerGuard 必须存活到进程结束
            let _guard = match adtrack::system::logging::init_logging(&get_config().logging) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("Failed to initialize logging: {:#}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = modes::run_server().await {
                match e.downcast_ref::<adtrack::errors::AdTrackError>() {
                    Some(err) => eprintln!("{}", err.format_colored()),
                    None => eprintln!("Server error: {:#}", e),
                }
                std::process::exit(1);
            }
        }
        Mode::Cli => {
            let Some(command) = cli.command else {
                return;
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
        }
    }
}
