use crate::config::BusKind;
use crate::payload::LiveOsHandle;
use crate::shutdown::ShutdownSignals;
use crate::subscription::RhsmStartup;
use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{error, info};
use zbus::connection;

mod client;
mod live_os;
mod subscription;

pub(crate) use client::{LiveOsProxy, SubscriptionProxy};
pub use live_os::{LiveOsInterface, LIVE_OS_PATH};
pub use subscription::{SubscriptionInterface, SUBSCRIPTION_PATH};

pub const BUS_NAME: &str = "org.installd";

struct DBus {
    shutdown: ShutdownSignals,
    bus: BusKind,
    payload: LiveOsHandle,
    /// Taken before the connection exists so no early change is missed.
    kernel_changes: Option<broadcast::Receiver<Vec<String>>>,
    startup: RhsmStartup,
}

impl DBus {
    fn new(
        shutdown: ShutdownSignals,
        bus: BusKind,
        payload: LiveOsHandle,
        startup: RhsmStartup,
    ) -> Self {
        let kernel_changes = Some(payload.subscribe());
        Self {
            shutdown,
            bus,
            payload,
            kernel_changes,
            startup,
        }
    }

    async fn run(&mut self) {
        info!("DBus task is running");

        if let Err(err) = self.serve().await {
            error!("DBus task failed: {err:#}");
            self.shutdown.token.cancel();
        }
    }

    async fn serve(&mut self) -> Result<()> {
        let builder = match self.bus {
            BusKind::System => connection::Builder::system(),
            BusKind::Session => connection::Builder::session(),
        }
        .context("Failed to create D-Bus connection")?;

        let connection = builder
            .name(BUS_NAME)
            .context("Failed to set D-Bus name")?
            .build()
            .await
            .context("Failed to build D-Bus connection")?;

        // the Live OS interface needs the connection to emit its signal
        let changes = self
            .kernel_changes
            .take()
            .unwrap_or_else(|| self.payload.subscribe());
        let live_os = LiveOsInterface::new(self.payload.clone(), changes, &connection);
        connection
            .object_server()
            .at(LIVE_OS_PATH, live_os)
            .await
            .context("Failed to serve Live OS interface")?;
        connection
            .object_server()
            .at(SUBSCRIPTION_PATH, SubscriptionInterface::new(self.startup.clone()))
            .await
            .context("Failed to serve Subscription interface")?;

        info!("Serving {BUS_NAME} on the {:?} bus", self.bus);

        // wait for the shutdown signal
        self.shutdown.token.cancelled().await;
        Ok(())
    }
}

#[derive(Clone)]
pub struct DbusHandle {}

impl DbusHandle {
    pub fn new(
        shutdown: ShutdownSignals,
        bus: BusKind,
        payload: LiveOsHandle,
        startup: RhsmStartup,
    ) -> Self {
        let mut actor = DBus::new(shutdown, bus, payload, startup);
        tokio::spawn(async move { actor.run().await });

        Self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PayloadConfig;
    use crate::shutdown::ShutdownHandler;
    use crate::task::TaskHandle;
    use std::fs;

    #[tokio::test]
    async fn kernel_changes_before_serving_are_kept() {
        let shutdown = ShutdownHandler::new();
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("boot")).unwrap();
        fs::write(root.path().join("boot/vmlinuz-6.5.6-300.fc39.x86_64"), b"").unwrap();
        let config = PayloadConfig {
            image_root: root.path().to_path_buf(),
            efi_dir: None,
        };
        let payload = LiveOsHandle::new(shutdown.signals(), &config);
        let startup = RhsmStartup::from_handle(TaskHandle::lost("Start RHSM DBus service"));

        let mut dbus = DBus::new(shutdown.signals(), BusKind::Session, payload.clone(), startup);
        payload.update_kernel_version_list().await.unwrap();

        let mut changes = dbus.kernel_changes.take().unwrap();
        assert_eq!(changes.try_recv().unwrap(), vec!["6.5.6-300.fc39.x86_64"]);
    }
}
