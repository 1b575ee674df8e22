use crate::subscription::RhsmStartup;
use std::time::Duration;
use zbus::{fdo, interface};

pub const SUBSCRIPTION_PATH: &str = "/org/installd/Subscription";

pub struct SubscriptionInterface {
    startup: RhsmStartup,
}

impl SubscriptionInterface {
    pub fn new(startup: RhsmStartup) -> Self {
        Self { startup }
    }
}

#[interface(name = "org.installd.Subscription1")]
impl SubscriptionInterface {
    /// Whether RHSM is up, waiting up to `timeout_secs` for it to start.
    async fn is_service_available(&self, timeout_secs: f64) -> fdo::Result<bool> {
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .map_err(|_| fdo::Error::InvalidArgs(format!("Invalid timeout: {timeout_secs}")))?;

        Ok(self.startup.is_service_available(timeout).await)
    }

    /// Default timeout of `IsServiceAvailable`, in seconds.
    #[zbus(property)]
    async fn default_timeout(&self) -> f64 {
        self.startup.default_timeout().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{
        RhsmStartup, ServiceConfig, ServiceManager, StartRhsmTask, RHSM_SERVICE_TIMEOUT,
    };
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct ExitCode(i32);

    #[async_trait]
    impl ServiceManager for ExitCode {
        async fn start(&self, _unit: &str) -> Result<i32> {
            Ok(self.0)
        }
    }

    struct AcceptAll;

    #[async_trait]
    impl ServiceConfig for AcceptAll {
        async fn set(&self, _key: &str, _value: &str, _extra: &str) -> Result<()> {
            Ok(())
        }
    }

    fn startup_with_exit_code(rc: i32) -> RhsmStartup {
        StartRhsmTask::new(
            "rhsm.service",
            "DEBUG",
            Arc::new(ExitCode(rc)),
            Arc::new(AcceptAll),
        )
        .start(RHSM_SERVICE_TIMEOUT)
    }

    #[tokio::test]
    async fn reports_started_service() {
        let interface = SubscriptionInterface::new(startup_with_exit_code(0));

        assert!(interface.is_service_available(5.0).await.unwrap());
        assert_eq!(interface.default_timeout().await, 60.0);
    }

    #[tokio::test]
    async fn reports_failed_service() {
        let interface = SubscriptionInterface::new(startup_with_exit_code(1));

        assert!(!interface.is_service_available(5.0).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_invalid_timeouts() {
        let interface = SubscriptionInterface::new(startup_with_exit_code(0));

        for timeout in [-1.0, f64::NAN, f64::INFINITY] {
            let err = interface.is_service_available(timeout).await.unwrap_err();
            assert!(matches!(err, fdo::Error::InvalidArgs(_)));
        }
    }
}
