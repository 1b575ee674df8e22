use super::actor::{Actor, ActorMessage};
use crate::config::PayloadConfig;
use crate::shutdown::ShutdownSignals;
use anyhow::{anyhow, Result};
use tokio::sync::{broadcast, mpsc, oneshot};

const CHANGES_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct Handler {
    sender: mpsc::Sender<ActorMessage>,
    changes: broadcast::Sender<Vec<String>>,
}

impl Handler {
    pub fn new(shutdown: ShutdownSignals, config: &PayloadConfig) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        let mut actor = Actor::new(
            shutdown,
            receiver,
            changes.clone(),
            config.image_root.clone(),
            config.efi_dir.clone(),
        );
        tokio::spawn(async move { actor.run().await });

        Self { sender, changes }
    }

    /// Recomputes the kernel version list from the live image.
    ///
    /// Subscribers get the new list only when it differs from the old one.
    pub async fn update_kernel_version_list(&self) -> Result<()> {
        let (rpc, receiver) = oneshot::channel();
        self.sender
            .send(ActorMessage::UpdateKernelVersionList { rpc })
            .await
            .map_err(|_| anyhow!("Live OS payload is not running"))?;
        receiver
            .await
            .map_err(|_| anyhow!("Live OS payload dropped the update request"))?
    }

    pub async fn kernel_version_list(&self) -> Result<Vec<String>> {
        let (rpc, receiver) = oneshot::channel();
        self.sender
            .send(ActorMessage::KernelVersionList { rpc })
            .await
            .map_err(|_| anyhow!("Live OS payload is not running"))?;
        receiver
            .await
            .map_err(|_| anyhow!("Live OS payload dropped the list request"))
    }

    /// Registers a new observer of kernel version list changes.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.changes.subscribe()
    }
}
