//! Errors raised by filesystem providers.

#[derive(thiserror::Error, Debug)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("ioctl {0} failed: {1}")]
    Io(&'static str, #[source] std::io::Error),

    #[error("i/o error: {0}")]
    OtherIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
