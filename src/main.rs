use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use selfoss_discord::{logging, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        logging::init_console_only(&config.logging.level);
    }

    match selfoss_discord::run(&config).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
