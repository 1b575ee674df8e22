//! installd
//!
//! Without a subcommand this runs the daemon, which is what the systemd unit
//! does. With one it talks to the running daemon over D-Bus.

use installd::control::{self, Outcome};
use installd::daemon;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match control::execute().await {
        Ok(Outcome::Daemon(config)) => match daemon::run(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        },
        Ok(Outcome::Done(code)) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
