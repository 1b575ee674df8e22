//! Daemon-wide shutdown.
//!
//! Every actor holds a [`ShutdownSignals`]. Cancelling its token asks all of
//! them to stop, and the [`ShutdownHandler`] then waits until each one let go
//! of its copy, or until the drain timeout runs out.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// systemd sends SIGKILL after 90 s, stop well before that.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ShutdownSignals {
    pub token: CancellationToken,
    // dropped together with the actor that holds it
    _alive: mpsc::Sender<()>,
}

pub struct ShutdownHandler {
    signals: ShutdownSignals,
    drained: mpsc::Receiver<()>,
    drain_timeout: Duration,
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandler {
    pub fn new() -> Self {
        let (alive, drained) = mpsc::channel(1);
        Self {
            signals: ShutdownSignals {
                token: CancellationToken::new(),
                _alive: alive,
            },
            drained,
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn signals(&self) -> ShutdownSignals {
        self.signals.clone()
    }

    /// Returns once SIGINT or SIGTERM arrived, or a task cancelled the token,
    /// and the actors are gone.
    pub async fn wait(self) -> Result<()> {
        let token = self.signals.token.clone();

        select! {
            _ = token.cancelled() => info!("Shutdown requested by a task"),
            received = termination() => {
                info!("Received {}, shutting down", received?);
                token.cancel();
            }
        }

        self.drain().await;
        Ok(())
    }

    async fn drain(self) {
        let Self {
            signals,
            mut drained,
            drain_timeout,
        } = self;
        drop(signals);

        // recv only returns None once every sender is dropped
        if tokio::time::timeout(drain_timeout, drained.recv()).await.is_err() {
            warn!("Some tasks did not stop within {drain_timeout:?}, exiting anyway");
        }
    }
}

async fn termination() -> Result<&'static str> {
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to listen for SIGINT")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;

    select! {
        _ = sigint.recv() => Ok("SIGINT"),
        _ = sigterm.recv() => Ok("SIGTERM"),
    }
}
