#[cfg(target_os = "linux")]
pub mod udev_discovery;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub devnode: PathBuf,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("udev error: {0}")]
    UdevError(String),
    #[error("no {0} found")]
    NotFound(&'static str),
}

pub trait DeviceDiscovery {
    fn find_touchpads() -> Result<Vec<DeviceInfo>, DiscoveryError>;
    fn find_pointers() -> Result<Vec<DeviceInfo>, DiscoveryError>;
}
