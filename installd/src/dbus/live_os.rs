use crate::payload::LiveOsHandle;
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zbus::object_server::SignalEmitter;
use zbus::{fdo, interface, Connection};

pub const LIVE_OS_PATH: &str = "/org/installd/Payloads/LiveOS";

/// D-Bus face of the Live OS payload.
///
/// Every call goes straight to the payload. Kernel version list changes seen
/// by `changes` are re-emitted as `KernelVersionListChanged` until the
/// interface is dropped, including those queued before the bus was up.
pub struct LiveOsInterface {
    payload: LiveOsHandle,
    relay: JoinHandle<()>,
}

impl LiveOsInterface {
    pub fn new(
        payload: LiveOsHandle,
        changes: broadcast::Receiver<Vec<String>>,
        connection: &Connection,
    ) -> Self {
        let connection = connection.clone();
        Self::with_emitter(payload, changes, move |kernel_version_list| {
            let connection = connection.clone();
            async move {
                let emitter = SignalEmitter::new(&connection, LIVE_OS_PATH)?;
                LiveOsInterface::kernel_version_list_changed(&emitter, &kernel_version_list).await
            }
        })
    }

    pub(crate) fn with_emitter<F, Fut>(
        payload: LiveOsHandle,
        changes: broadcast::Receiver<Vec<String>>,
        emit: F,
    ) -> Self
    where
        F: FnMut(Vec<String>) -> Fut + Send + 'static,
        Fut: Future<Output = zbus::Result<()>> + Send + 'static,
    {
        let relay = relay_changes(changes, emit);
        Self { payload, relay }
    }
}

impl Drop for LiveOsInterface {
    fn drop(&mut self) {
        self.relay.abort();
    }
}

#[interface(name = "org.installd.Payloads.LiveOS1")]
impl LiveOsInterface {
    /// Update the list of kernel versions.
    async fn refresh(&self) -> fdo::Result<()> {
        self.payload
            .update_kernel_version_list()
            .await
            .map_err(|err| fdo::Error::Failed(format!("{err:#}")))
    }

    /// Get the kernel versions list.
    async fn get_kernel_version_list(&self) -> fdo::Result<Vec<String>> {
        self.payload
            .kernel_version_list()
            .await
            .map_err(|err| fdo::Error::Failed(format!("{err:#}")))
    }

    #[zbus(signal)]
    async fn kernel_version_list_changed(
        emitter: &SignalEmitter<'_>,
        kernel_version_list: &[String],
    ) -> zbus::Result<()>;
}

/// Forwards every change from `changes` to `emit` until the payload goes away.
fn relay_changes<F, Fut>(
    mut changes: broadcast::Receiver<Vec<String>>,
    mut emit: F,
) -> JoinHandle<()>
where
    F: FnMut(Vec<String>) -> Fut + Send + 'static,
    Fut: Future<Output = zbus::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(kernel_version_list) => {
                    if let Err(err) = emit(kernel_version_list).await {
                        warn!("Failed to emit KernelVersionListChanged: {err}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // the next message carries the full list anyway
                    warn!("Kernel version relay skipped {skipped} changes");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Kernel version relay stopped");
    })
}
