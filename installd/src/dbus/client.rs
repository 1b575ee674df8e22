use zbus::{proxy, Result};

#[proxy(
    interface = "org.installd.Payloads.LiveOS1",
    default_service = "org.installd",
    default_path = "/org/installd/Payloads/LiveOS",
    gen_blocking = false
)]
pub(crate) trait LiveOs {
    async fn refresh(&self) -> Result<()>;
    async fn get_kernel_version_list(&self) -> Result<Vec<String>>;

    #[zbus(signal)]
    fn kernel_version_list_changed(&self, kernel_version_list: Vec<String>) -> Result<()>;
}

#[proxy(
    interface = "org.installd.Subscription1",
    default_service = "org.installd",
    default_path = "/org/installd/Subscription",
    gen_blocking = false
)]
pub(crate) trait Subscription {
    async fn is_service_available(&self, timeout_secs: f64) -> Result<bool>;

    #[zbus(property)]
    fn default_timeout(&self) -> Result<f64>;
}
