use crate::task::{self, Task, TaskHandle, WaitStatus};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const RHSM_SYSTEMD_UNIT_NAME: &str = "rhsm.service";
pub const RHSM_LOG_LEVEL_KEY: &str = "logging.default_log_level";
pub const RHSM_DEFAULT_LOG_LEVEL: &str = "DEBUG";
/// How long to wait for RHSM when nobody says otherwise.
pub const RHSM_SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

/// Something that can start a system service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Starts `unit` and returns the exit status, 0 meaning success.
    async fn start(&self, unit: &str) -> Result<i32>;
}

/// Configuration object of a running service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceConfig: Send + Sync {
    async fn set(&self, key: &str, value: &str, extra: &str) -> Result<()>;
}

/// Starts the RHSM service and turns its logging up.
pub struct StartRhsmTask {
    unit: String,
    log_level: String,
    manager: Arc<dyn ServiceManager>,
    config: Arc<dyn ServiceConfig>,
}

impl StartRhsmTask {
    pub fn new(
        unit: impl Into<String>,
        log_level: impl Into<String>,
        manager: Arc<dyn ServiceManager>,
        config: Arc<dyn ServiceConfig>,
    ) -> Self {
        Self {
            unit: unit.into(),
            log_level: log_level.into(),
            manager,
            config,
        }
    }

    /// Runs the task in the background, `default_timeout` bounds
    /// [`RhsmStartup::wait_for_service`].
    pub fn start(self, default_timeout: Duration) -> RhsmStartup {
        RhsmStartup {
            handle: task::spawn(self),
            default_timeout,
        }
    }
}

#[async_trait]
impl Task for StartRhsmTask {
    type Output = bool;

    fn name(&self) -> &str {
        "Start RHSM DBus service"
    }

    async fn run(&self) -> Result<bool> {
        // a single attempt, whoever needs RHSM decides on retries
        let rc = match self.manager.start(&self.unit).await {
            Ok(rc) => rc,
            Err(err) => {
                warn!("Could not start {}: {err:#}", self.unit);
                return Ok(false);
            }
        };

        if rc != 0 {
            warn!(
                "RHSM systemd service {} failed to start with error code: {rc}",
                self.unit
            );
            return Ok(false);
        }

        // RHSM logs are useless for debugging subscription issues otherwise
        debug!("Setting RHSM log level to {}", self.log_level);
        if let Err(err) = self
            .config
            .set(RHSM_LOG_LEVEL_KEY, &self.log_level, "")
            .await
        {
            error!("RHSM started but its log level could not be set: {err:#}");
            return Ok(false);
        }

        debug!("RHSM service started successfully");
        Ok(true)
    }
}

/// Readiness side of a [`StartRhsmTask`].
#[derive(Clone)]
pub struct RhsmStartup {
    handle: TaskHandle<bool>,
    default_timeout: Duration,
}

impl RhsmStartup {
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Returns whether RHSM is up, waiting up to `timeout` if the start is
    /// still in progress.
    ///
    /// `false` after a timeout only means "not yet", the start keeps going
    /// and a later call may return `true`.
    pub async fn is_service_available(&self, timeout: Duration) -> bool {
        if self.handle.is_running() {
            debug!("Waiting for RHSM service to start for up to {timeout:?}");
            if self.handle.wait(timeout).await == WaitStatus::Lost {
                error!("RHSM startup task is running but nothing is driving it");
                return false;
            }
        }

        if self.handle.is_running() {
            debug!("RHSM service not available after waiting for {timeout:?}");
            return false;
        }

        match self.handle.result() {
            Ok(available) => available,
            Err(err) => {
                error!("Got no result from the RHSM startup task: {err}");
                false
            }
        }
    }

    /// [`Self::is_service_available`] with the configured timeout.
    pub async fn wait_for_service(&self) -> bool {
        self.is_service_available(self.default_timeout).await
    }

    #[cfg(test)]
    pub(crate) fn from_handle(handle: TaskHandle<bool>) -> Self {
        Self {
            handle,
            default_timeout: RHSM_SERVICE_TIMEOUT,
        }
    }
}
