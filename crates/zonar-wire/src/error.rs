//! Errors raised while encoding or decoding zonar wire messages.

/// Errors that can occur while turning bytes on the wire into the
/// request/reply structures in this crate, or back.
#[derive(thiserror::Error, Debug)]
pub enum WireError {
    /// The magic value at the start of a header did not match
    /// [`crate::MAGIC`].
    #[error("bad magic value: {0:#010x}")]
    BadMagic(u32),

    /// A reply's `id` field did not match the id of the request it answers.
    #[error("reply id {got} does not match request id {expected}")]
    IdMismatch { expected: u32, got: u32 },

    /// A request carried an `id` not present in [`crate::RequestId`].
    #[error("unknown request id: {0}")]
    UnknownRequestId(u32),

    /// A reply payload's size was not a multiple of the record size it is
    /// supposed to be packed with.
    #[error("payload size {size} is not a multiple of record size {record_size}")]
    UnalignedPayload { size: usize, record_size: usize },

    /// Lower-level (de)serialization failure from `binrw`.
    #[error("binary codec error: {0}")]
    Codec(#[from] binrw::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;
