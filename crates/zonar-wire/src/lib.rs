//! On-the-wire request/reply structures for the zonar remote inspection
//! protocol.
//!
//! This crate only knows how to encode and decode bytes; it has no
//! knowledge of sockets, devices, or filesystems. See `zonar-core` for the
//! transport that moves these structures over TCP, and `zonar-device` /
//! `zonar-fs` for the local producers of the data they carry.

#![forbid(unsafe_code)]

mod blockgroup;
mod device;
mod error;
mod extent;
mod fixed_str;
mod header;
mod zone;

pub use blockgroup::BlockgroupRecord;
pub use device::{DevInfoReply, MntdirInfoReply, VENDOR_ID_LEN};
pub use error::{Result, WireError};
pub use extent::{ExtentRecord, ExtentTag};
pub use fixed_str::FixedStr;
pub use header::{ReplyHeader, RequestHeader, RequestId};
pub use zone::{ZoneCondition, ZoneRecord, ZoneType};

/// ASCII `"zone"`, the four bytes every request and reply header begins
/// with.
pub const MAGIC: [u8; 4] = *b"zone";

/// Maximum encoded path length, matching the host kernel's `PATH_MAX`.
pub const PATH_MAX: usize = 4096;

/// Fixed width of the free-text annotation field on an [`ExtentRecord`].
pub const ANNOTATION_LEN: usize = 352;

/// Number of opaque zone-index slots reserved on a [`BlockgroupRecord`].
pub const MAX_ZONES_PER_BLOCKGROUP: usize = 512;
