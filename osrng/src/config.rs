use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Canonical non-blocking kernel random device.
pub const DEFAULT_DEVICE: &str = "/dev/urandom";

/// Kernel random device that blocks until the pool is initialised.
pub const BLOCKING_POOL_DEVICE: &str = "/dev/random";

/// Configuration for the OS entropy device reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RngConfig {
    /// Path to the character device to read from.
    pub device: PathBuf,
    /// Open the device with `O_NONBLOCK`. A read that finds the device empty
    /// then fails with a retryable truncation instead of waiting.
    pub nonblocking: bool,
}

impl Default for RngConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            nonblocking: false,
        }
    }
}

impl RngConfig {
    /// Config for an alternate device node.
    pub fn with_device(device: impl AsRef<Path>) -> Self {
        Self {
            device: device.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Config reading from the kernel's blocking pool.
    pub fn blocking_pool() -> Self {
        Self::with_device(BLOCKING_POOL_DEVICE)
    }

    /// Validate that the configuration is self-consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDevicePath);
        }

        if !self.device.is_absolute() {
            return Err(ConfigError::RelativeDevicePath(self.device.clone()));
        }

        Ok(())
    }
}

/// Errors arising from reader configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("device path is empty")]
    EmptyDevicePath,
    #[error("device path must be absolute: {}", .0.display())]
    RelativeDevicePath(PathBuf),
}
