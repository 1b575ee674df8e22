mod actor;
mod handler;
pub mod kernels;

pub use handler::Handler as LiveOsHandle;

#[cfg(test)]
mod tests {
    use super::LiveOsHandle;
    use crate::config::PayloadConfig;
    use crate::shutdown::ShutdownHandler;
    use std::fs;
    use std::path::Path;
    use tokio::sync::broadcast::error::TryRecvError;

    fn add_kernel(root: &Path, version: &str) {
        let boot = root.join("boot");
        fs::create_dir_all(&boot).unwrap();
        fs::write(boot.join(format!("vmlinuz-{version}")), b"").unwrap();
    }

    fn payload_for(root: &Path) -> (ShutdownHandler, LiveOsHandle) {
        let shutdown = ShutdownHandler::new();
        let config = PayloadConfig {
            image_root: root.to_path_buf(),
            efi_dir: None,
        };
        let payload = LiveOsHandle::new(shutdown.signals(), &config);
        (shutdown, payload)
    }

    #[tokio::test]
    async fn list_is_empty_before_first_update() {
        let root = tempfile::tempdir().unwrap();
        add_kernel(root.path(), "6.5.6-300.fc39.x86_64");
        let (_shutdown, payload) = payload_for(root.path());

        assert!(payload.kernel_version_list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_publishes_new_list_once() {
        let root = tempfile::tempdir().unwrap();
        add_kernel(root.path(), "6.5.6-300.fc39.x86_64");
        let (_shutdown, payload) = payload_for(root.path());
        let mut changes = payload.subscribe();

        payload.update_kernel_version_list().await.unwrap();

        assert_eq!(
            payload.kernel_version_list().await.unwrap(),
            vec!["6.5.6-300.fc39.x86_64"]
        );
        assert_eq!(changes.try_recv().unwrap(), vec!["6.5.6-300.fc39.x86_64"]);

        // same kernels, nothing to announce
        payload.update_kernel_version_list().await.unwrap();
        assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));

        add_kernel(root.path(), "6.7.1-200.fc39.x86_64");
        payload.update_kernel_version_list().await.unwrap();
        assert_eq!(
            changes.try_recv().unwrap(),
            vec!["6.5.6-300.fc39.x86_64", "6.7.1-200.fc39.x86_64"]
        );
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_list() {
        let root = tempfile::tempdir().unwrap();
        let image = root.path().join("image");
        add_kernel(&image, "6.5.6-300.fc39.x86_64");
        let (_shutdown, payload) = payload_for(&image);

        payload.update_kernel_version_list().await.unwrap();
        fs::remove_dir_all(&image).unwrap();

        assert!(payload.update_kernel_version_list().await.is_err());
        assert_eq!(
            payload.kernel_version_list().await.unwrap(),
            vec!["6.5.6-300.fc39.x86_64"]
        );
    }

    #[tokio::test]
    async fn concurrent_updates_publish_once() {
        let root = tempfile::tempdir().unwrap();
        add_kernel(root.path(), "6.5.6-300.fc39.x86_64");
        let (_shutdown, payload) = payload_for(root.path());
        let other = payload.clone();
        let mut changes = payload.subscribe();

        let (first, second) = tokio::join!(
            payload.update_kernel_version_list(),
            other.update_kernel_version_list()
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(changes.try_recv().unwrap(), vec!["6.5.6-300.fc39.x86_64"]);
        assert_eq!(changes.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn calls_fail_after_shutdown() {
        let root = tempfile::tempdir().unwrap();
        let (shutdown, payload) = payload_for(root.path());

        shutdown.signals().token.cancel();
        // give the actor a chance to see the cancellation
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert!(payload.kernel_version_list().await.is_err());
    }
}
