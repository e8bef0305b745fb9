use std::process::ExitCode;

use log_pusher::app::{shutdown_signal, App, StartupError};
use log_pusher::config::{AppConfig, DEFAULT_LOG_LEVEL};
use log_pusher::init::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "log pusher failed");
            eprintln!("log-pusher: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env();
    let level = config
        .as_ref()
        .map(|c| c.log_level.as_str())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_tracing(level)?;
    let config = config?;

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        "starting log pusher with scheduled log pushing"
    );
    let app = App::start(config).await?;
    app.serve(shutdown_signal()).await
}
