use super::connect;
use crate::config::BusKind;
use crate::dbus::SubscriptionProxy;
use anyhow::Result;
use std::process::ExitCode;
use tracing::{info, warn};

/// D-Bus gives up on a method call after 25 seconds, stay below that.
const MAX_WAIT_SECS: f64 = 20.0;

/// Asks the daemon whether RHSM is up, the exit code tells scripts the same.
pub async fn status(bus: BusKind, timeout: Option<f64>) -> Result<ExitCode> {
    let connection = connect(bus).await?;

    let proxy = SubscriptionProxy::new(&connection).await?;

    let requested = match timeout {
        Some(timeout) => timeout,
        None => proxy.default_timeout().await?,
    };

    let timeout = requested.min(MAX_WAIT_SECS);
    if timeout < requested {
        warn!("Waiting at most {MAX_WAIT_SECS} seconds instead of {requested}");
    }

    info!("Waiting up to {timeout} seconds for the subscription service");
    let available = proxy.is_service_available(timeout).await?;

    if available {
        println!("subscription service: available");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("subscription service: not available");
        Ok(ExitCode::FAILURE)
    }
}
