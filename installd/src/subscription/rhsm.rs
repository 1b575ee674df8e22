use super::ServiceConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use zbus::zvariant::Value;
use zbus::{proxy, Connection};

#[proxy(
    interface = "com.redhat.RHSM1.Config",
    default_service = "com.redhat.RHSM1",
    default_path = "/com/redhat/RHSM1/Config",
    gen_blocking = false
)]
trait RhsmConfig {
    async fn set(&self, setting: &str, value: &Value<'_>, locale: &str) -> zbus::Result<()>;
}

/// Writes RHSM settings through its configuration object on the system bus.
///
/// A fresh proxy is created for every write since RHSM is usually started
/// right before it is configured.
pub struct RhsmServiceConfig;

#[async_trait]
impl ServiceConfig for RhsmServiceConfig {
    async fn set(&self, key: &str, value: &str, extra: &str) -> Result<()> {
        let connection = Connection::system()
            .await
            .context("Failed to connect to the system bus")?;
        let proxy = RhsmConfigProxy::new(&connection)
            .await
            .context("Failed to create RHSM config proxy")?;

        proxy
            .set(key, &Value::from(value), extra)
            .await
            .with_context(|| format!("Failed to set RHSM config {key}"))?;

        Ok(())
    }
}
