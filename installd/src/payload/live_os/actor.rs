use super::kernels;
use crate::shutdown::ShutdownSignals;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

#[derive(Debug)]
pub enum ActorMessage {
    UpdateKernelVersionList { rpc: oneshot::Sender<Result<()>> },
    KernelVersionList { rpc: oneshot::Sender<Vec<String>> },
}

/// Live OS payload actor, owns the kernel version list
pub struct Actor {
    shutdown: ShutdownSignals,
    receiver: mpsc::Receiver<ActorMessage>,
    changes: broadcast::Sender<Vec<String>>,
    image_root: PathBuf,
    efi_dir: Option<String>,
    kernel_version_list: Vec<String>,
}

impl Actor {
    pub fn new(
        shutdown: ShutdownSignals,
        receiver: mpsc::Receiver<ActorMessage>,
        changes: broadcast::Sender<Vec<String>>,
        image_root: PathBuf,
        efi_dir: Option<String>,
    ) -> Self {
        Self {
            shutdown,
            receiver,
            changes,
            image_root,
            efi_dir,
            kernel_version_list: Vec::new(),
        }
    }

    async fn handle_message(&mut self, msg: ActorMessage) {
        match msg {
            ActorMessage::UpdateKernelVersionList { rpc } => {
                _ = rpc.send(self.update_kernel_version_list().await);
            }
            ActorMessage::KernelVersionList { rpc } => {
                _ = rpc.send(self.kernel_version_list.clone());
            }
        }
    }

    async fn update_kernel_version_list(&mut self) -> Result<()> {
        // the live image may sit on slow media, keep the scan off the runtime
        let image_root = self.image_root.clone();
        let efi_dir = self.efi_dir.clone();
        let kernel_version_list =
            tokio::task::spawn_blocking(move || kernels::scan(&image_root, efi_dir.as_deref()))
                .await
                .context("Kernel scan did not complete")??;

        if kernel_version_list == self.kernel_version_list {
            debug!("Kernel version list unchanged: {:?}", kernel_version_list);
            return Ok(());
        }

        info!("Kernel version list changed: {:?}", kernel_version_list);
        self.kernel_version_list = kernel_version_list;

        // nobody listening is fine
        _ = self.changes.send(self.kernel_version_list.clone());
        Ok(())
    }

    pub async fn run(&mut self) {
        info!("Live OS payload starting, image at {}", self.image_root.display());

        loop {
            tokio::select! {
                msg = self.receiver.recv() => {
                    let Some(msg) = msg else {
                        break;
                    };
                    self.handle_message(msg).await;
                }
                _ = self.shutdown.token.cancelled() => {
                    break;
                }
            }
        }

        info!("Live OS payload shutting down");
    }
}
