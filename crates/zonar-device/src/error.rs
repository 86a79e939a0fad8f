//! Errors raised while probing a block device.

/// Errors that can occur while opening a device or reading its geometry or
/// zone report.
#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("sysfs attribute not found: {0}")]
    NotFound(String),

    #[error("invalid device geometry: {0}")]
    InvalidGeometry(String),

    #[error("ioctl {0} failed: {1}")]
    Io(&'static str, #[source] std::io::Error),

    #[error("i/o error: {0}")]
    OtherIo(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
