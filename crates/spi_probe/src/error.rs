//! Errors produced while probing an SPI device.

use std::io;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The device node does not exist or is held exclusively elsewhere
    #[error("SPI device unavailable: {0}")]
    DeviceUnavailable(String),
    /// The caller lacks access rights to the device node
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// The driver rejected the requested clock speed, mode or word size
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    /// Bus fault or timeout during a transfer
    #[error("I/O error: {0}")]
    Io(String),
    /// Transfer attempted before the handle was configured
    #[error("SPI handle not configured")]
    NotConfigured,
    /// Configure called on a handle that was already configured
    #[error("SPI handle already configured")]
    AlreadyConfigured,
    /// Second transfer attempted on a handle
    #[error("SPI handle transfer already complete")]
    TransferComplete,
    /// Handle used after it was closed
    #[error("SPI handle already closed")]
    Closed,
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProbeError {
    /// Classify an OS error raised while acquiring a device node.
    pub fn from_open_error(err: &io::Error, context: &str) -> Self {
        let msg = format!("{}: {}", context, err);
        match err.kind() {
            io::ErrorKind::NotFound => return ProbeError::DeviceUnavailable(msg),
            io::ErrorKind::PermissionDenied => return ProbeError::PermissionDenied(msg),
            _ => {}
        }
        match err.raw_os_error() {
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::ENXIO) | Some(libc::EBUSY) => {
                ProbeError::DeviceUnavailable(msg)
            }
            Some(libc::EACCES) | Some(libc::EPERM) => ProbeError::PermissionDenied(msg),
            _ => ProbeError::Io(msg),
        }
    }

    /// Classify an OS error raised by a configuration request.
    pub fn from_configure_error(err: &io::Error, context: &str) -> Self {
        let msg = format!("{}: {}", context, err);
        match err.raw_os_error() {
            Some(libc::EINVAL) | Some(libc::EOPNOTSUPP) => ProbeError::UnsupportedConfiguration(msg),
            _ => ProbeError::Io(msg),
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        ProbeError::Io(err.to_string())
    }
}
