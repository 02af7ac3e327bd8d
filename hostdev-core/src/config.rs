//! Configuration management.

use crate::error::{HostDevError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an alternate config file.
pub const CONFIG_ENV_VAR: &str = "HOSTDEV_CONFIG";

/// Default location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hostdev/config.json";

/// Base directory the container runtime mounts DRA device metadata under.
pub const DEFAULT_DRA_METADATA_DIR: &str = "/var/run/kubevirt-dra/metadata";

/// Configuration for host device resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dra_metadata_dir: PathBuf,
    pub gpu_env_prefix: String,
    pub vgpu_env_prefix: String,
    pub sriov_resource_name_prefix: String,
    pub pci_resource_env_prefix: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dra_metadata_dir: PathBuf::from(DEFAULT_DRA_METADATA_DIR),
            gpu_env_prefix: "GPU_PASSTHROUGH_DEVICES".to_string(),
            vgpu_env_prefix: "VGPU_PASSTHROUGH_DEVICES".to_string(),
            sriov_resource_name_prefix: "KUBEVIRT_RESOURCE_NAME_".to_string(),
            pci_resource_env_prefix: "PCIDEVICE".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Get the path to the configuration file.
    ///
    /// `HOSTDEV_CONFIG` wins over the default location.
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from disk, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| HostDevError::InvalidConfig {
            reason: format!("Failed to read config {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&content).map_err(|e| HostDevError::InvalidConfig {
            reason: format!("Failed to parse config {}: {}", path.display(), e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HostDevError::IoError { path: parent.to_path_buf(), source: e })?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| HostDevError::InvalidConfig {
                reason: format!("Failed to serialize config: {}", e),
            })?;
        std::fs::write(path, content)
            .map_err(|e| HostDevError::IoError { path: path.to_path_buf(), source: e })
    }
}
