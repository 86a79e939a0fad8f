//! Top-level error type, unifying the lower crates' errors and giving
//! them an errno-like numeric code for the wire protocol.

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Device(#[from] zonar_device::DeviceError),

    #[error(transparent)]
    Fs(#[from] zonar_fs::FsError),

    #[error(transparent)]
    Wire(#[from] zonar_wire::WireError),

    #[error("mount path {0} is not a mount point")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("connection reset")]
    ConnectionReset,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// A positive, errno-like numeric code carried in the wire reply
    /// header's `err` field.
    pub fn errno_like(&self) -> u32 {
        match self {
            CoreError::Device(zonar_device::DeviceError::NotFound(_)) => libc::ENOENT as u32,
            CoreError::Device(zonar_device::DeviceError::InvalidGeometry(_)) => libc::EINVAL as u32,
            CoreError::Device(zonar_device::DeviceError::Invalid(_)) => libc::EINVAL as u32,
            CoreError::Device(zonar_device::DeviceError::Io(..)) => libc::EIO as u32,
            CoreError::Device(zonar_device::DeviceError::OtherIo(_)) => libc::EIO as u32,
            CoreError::Fs(zonar_fs::FsError::NotFound(_)) => libc::ENOENT as u32,
            CoreError::Fs(zonar_fs::FsError::Unsupported(_)) => libc::ENOTSUP as u32,
            CoreError::Fs(zonar_fs::FsError::Invalid(_)) => libc::EINVAL as u32,
            CoreError::Fs(zonar_fs::FsError::OutOfMemory(_)) => libc::ENOMEM as u32,
            CoreError::Fs(zonar_fs::FsError::Io(..)) => libc::EIO as u32,
            CoreError::Fs(zonar_fs::FsError::OtherIo(_)) => libc::EIO as u32,
            CoreError::Wire(_) => libc::EPROTO as u32,
            CoreError::NotFound(_) => libc::ENOENT as u32,
            CoreError::Invalid(_) => libc::EINVAL as u32,
            CoreError::Unsupported(_) => libc::ENOTSUP as u32,
            CoreError::ConnectionReset => libc::ECONNRESET as u32,
            CoreError::Io(_) => libc::EIO as u32,
        }
    }

    pub fn from_errno(errno: u32) -> Self {
        if errno == libc::ENOENT as u32 {
            CoreError::NotFound("remote error".into())
        } else if errno == libc::ENOTSUP as u32 {
            CoreError::Unsupported("remote error".into())
        } else if errno == libc::ECONNRESET as u32 {
            CoreError::ConnectionReset
        } else {
            CoreError::Invalid(format!("remote error (errno {errno})"))
        }
    }
}
