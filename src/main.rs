use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use config::Config;
use docker::client::DockerEngine;
use docker::listener::ListenerContext;
use logs::HttpLogSender;

mod cli;
mod config;
mod dispatcher;
mod docker;
mod logs;
mod signals;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine, the environment alone is enough.
    let _ = dotenv::dotenv();

    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_args(cli::get_cli_args());

    log::info!("Starting container log dispatcher...");
    config.log_summary();
    log::info!("The Docker socket must be reachable, e.g. -v /var/run/docker.sock:/var/run/docker.sock");

    let engine = match DockerEngine::connect() {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to create Docker client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let sender = match HttpLogSender::new(
        config.logger_service_url.clone(),
        config.auth_header(),
        config.http_client_timeout,
    ) {
        Ok(sender) => sender,
        Err(e) => {
            log::error!("Failed to create logger service client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    if let Err(e) = signals::handle_shutdown(cancel.clone()) {
        log::error!("Unable to register signal handlers: {e}");
        return ExitCode::FAILURE;
    }
    let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]);

    let ctx = ListenerContext {
        engine: Arc::new(engine),
        sender: Arc::new(sender),
        cancel,
    };

    match dispatcher::run(ctx, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
