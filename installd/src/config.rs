use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::subscription::{RHSM_DEFAULT_LOG_LEVEL, RHSM_SERVICE_TIMEOUT, RHSM_SYSTEMD_UNIT_NAME};

const CONFIG_IN_CWD: &str = "./installd.toml";
const CONFIG_IN_ETC: &str = "/etc/installd/installd.toml";

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub payload: PayloadConfig,
    #[serde(default)]
    pub subscription: SubscriptionConfig,
    #[serde(default)]
    pub bus: BusConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PayloadConfig {
    /// Where the live image is mounted.
    pub image_root: PathBuf,
    /// Name of the distribution directory below `boot/efi/EFI`.
    pub efi_dir: Option<String>,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            image_root: PathBuf::from("/run/install/source"),
            efi_dir: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub unit: String,
    pub timeout_secs: u64,
    pub log_level: String,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            unit: RHSM_SYSTEMD_UNIT_NAME.to_string(),
            timeout_secs: RHSM_SERVICE_TIMEOUT.as_secs(),
            log_level: RHSM_DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl SubscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BusConfig {
    pub kind: BusKind,
}

impl Config {
    pub fn autoload() -> Result<(Self, Option<PathBuf>)> {
        let config_in_cwd = Path::new(CONFIG_IN_CWD);
        let config_in_etc = Path::new(CONFIG_IN_ETC);

        if config_in_cwd.exists() {
            info!("Loading installd.toml: LOCAL");
            Self::load_from_path(config_in_cwd)
        } else if config_in_etc.exists() {
            info!("Loading installd.toml: ETC");
            Self::load_from_path(config_in_etc)
        } else {
            warn!("Loading installd.toml: NO CONFIG FILE FOUND, using defaults");
            Ok((Self::default(), None))
        }
    }

    pub fn load(location: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(location) = location {
            info!("Loading installd.toml: {}", location.display());
            Self::load_from_path(location)
        } else {
            Self::autoload()
        }
    }

    pub fn load_from_path(location: &Path) -> Result<(Self, Option<PathBuf>)> {
        let contents = std::fs::read_to_string(location)
            .with_context(|| format!("Failed to read config file: {}", location.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", location.display()))?;

        Ok((config, Some(location.to_path_buf())))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.subscription.unit, "rhsm.service");
        assert_eq!(config.subscription.log_level, "DEBUG");
        assert_eq!(config.subscription.timeout(), RHSM_SERVICE_TIMEOUT);
        assert_eq!(config.bus.kind, BusKind::System);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
[payload]
image_root = "/mnt/live"
efi_dir = "fedora"

[subscription]
unit = "rhsm-test.service"
timeout_secs = 5
log_level = "INFO"

[bus]
kind = "session"
"#,
        )
        .unwrap();

        assert_eq!(config.payload.image_root, PathBuf::from("/mnt/live"));
        assert_eq!(config.payload.efi_dir.as_deref(), Some("fedora"));
        assert_eq!(config.subscription.unit, "rhsm-test.service");
        assert_eq!(config.subscription.timeout(), Duration::from_secs(5));
        assert_eq!(config.subscription.log_level, "INFO");
        assert_eq!(config.bus.kind, BusKind::Session);
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let config = Config::parse("[subscription]\ntimeout_secs = 10\n").unwrap();

        assert_eq!(config.subscription.unit, RHSM_SYSTEMD_UNIT_NAME);
        assert_eq!(config.subscription.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn unknown_bus_kind_is_rejected() {
        assert!(Config::parse("[bus]\nkind = \"peer\"\n").is_err());
    }

    #[test]
    fn load_reads_explicit_path() {
        let mut file = NamedTempFile::new().expect("Failed to create temporary file");
        file.write_all(b"[payload]\nimage_root = \"/srv/image\"\n")
            .expect("Failed to write to temporary file");

        let (config, path) = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.payload.image_root, PathBuf::from("/srv/image"));
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("installd.toml");

        assert!(Config::load(Some(&missing)).is_err());
    }
}
