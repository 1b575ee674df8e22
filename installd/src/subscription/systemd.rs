use super::ServiceManager;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

/// Starts units through `systemctl`.
pub struct Systemctl;

#[async_trait]
impl ServiceManager for Systemctl {
    async fn start(&self, unit: &str) -> Result<i32> {
        info!("Starting systemd unit {unit}");

        let output = Command::new("systemctl")
            .arg("start")
            .arg(unit)
            .output()
            .await
            .with_context(|| format!("Failed to run systemctl start {unit}"))?;

        if !output.status.success() {
            warn!(
                "systemctl start {unit}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        // killed by a signal, report it as a generic failure
        Ok(output.status.code().unwrap_or(1))
    }
}
