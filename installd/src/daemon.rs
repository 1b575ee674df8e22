use crate::config::Config;
use crate::dbus::DbusHandle;
use crate::payload::LiveOsHandle;
use crate::shutdown::ShutdownHandler;
use crate::subscription::{RhsmServiceConfig, StartRhsmTask, Systemctl};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(config: Config) -> Result<()> {
    info!("installd {} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = ShutdownHandler::new();

    let payload = LiveOsHandle::new(shutdown.signals(), &config.payload);

    // RHSM takes a while to come up, get it going before anyone asks
    let startup = StartRhsmTask::new(
        &config.subscription.unit,
        &config.subscription.log_level,
        Arc::new(Systemctl),
        Arc::new(RhsmServiceConfig),
    )
    .start(config.subscription.timeout());

    let _dbus = DbusHandle::new(
        shutdown.signals(),
        config.bus.kind,
        payload.clone(),
        startup.clone(),
    );

    // the D-Bus actor is subscribed by now, so this first change reaches the bus
    // once it is up. The image might not be mounted yet, clients can Refresh later
    if let Err(err) = payload.update_kernel_version_list().await {
        warn!("Initial kernel scan failed: {err:#}");
    }

    tokio::spawn(async move {
        if startup.wait_for_service().await {
            info!("RHSM service is available");
        } else {
            warn!("RHSM service is not available");
        }
    });

    // wait for the sweet release of death
    shutdown.wait().await?;

    info!("installd is shutting down");
    Ok(())
}
