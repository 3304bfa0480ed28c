use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use walsync::config::{self, ConfigLoadResult};
use walsync::logger;
use walsync::supervisor::{Supervisor, listen_for_signals};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match config::get_config() {
        ConfigLoadResult::Success(config) => config,
        ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(errors) = config.validate() {
        for error in errors {
            eprintln!("{}\n", error.user_message());
        }
        return ExitCode::FAILURE;
    }

    if let Err(e) = logger::setup_logger(config.logging()) {
        eprintln!("Failed to initialize logger: {e}");
        return ExitCode::FAILURE;
    }

    let Some(home) = dirs::home_dir() else {
        log::error!("Could not determine the home directory");
        return ExitCode::FAILURE;
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(listen_for_signals(shutdown.clone()));

    match Supervisor::from_config(config, &home).run(shutdown).await {
        Ok(reason) => {
            log::info!("Exiting: {reason}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
