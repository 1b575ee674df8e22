//! Subscription management.
//!
//! The installer talks to RHSM over D-Bus, so `rhsm.service` is started in
//! the background as soon as the daemon comes up. Callers that actually need
//! the service ask [`RhsmStartup::is_service_available`], which waits a
//! bounded amount of time for the start to finish.

mod rhsm;
mod start;
mod systemd;

pub use rhsm::RhsmServiceConfig;
pub use start::{
    RhsmStartup, ServiceConfig, ServiceManager, StartRhsmTask, RHSM_DEFAULT_LOG_LEVEL,
    RHSM_LOG_LEVEL_KEY, RHSM_SERVICE_TIMEOUT, RHSM_SYSTEMD_UNIT_NAME,
};
pub use systemd::Systemctl;
