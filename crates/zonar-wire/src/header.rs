//! Request/reply header framing. Bit-exact across implementations, so
//! client and server binaries can interoperate regardless of version.

use binrw::prelude::*;

use crate::fixed_str::FixedStr;
use crate::{PATH_MAX, WireError};

/// Request identifiers carried in [`RequestHeader::id`].
#[derive(BinRead, BinWrite, Debug, PartialEq, Eq, Clone, Copy)]
#[brw(big, repr(u32))]
pub enum RequestId {
    MntdirInfo = 1,
    DevInfo = 2,
    DevRepZones = 3,
    FileExtents = 4,
    ExtentsInRange = 5,
    Blockgroups = 6,
}

impl TryFrom<u32> for RequestId {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => RequestId::MntdirInfo,
            2 => RequestId::DevInfo,
            3 => RequestId::DevRepZones,
            4 => RequestId::FileExtents,
            5 => RequestId::ExtentsInRange,
            6 => RequestId::Blockgroups,
            other => return Err(WireError::UnknownRequestId(other)),
        })
    }
}

/// Fixed-shape request header.
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(big, magic(b"zone"))]
pub struct RequestHeader {
    pub id: u32,
    pub zone_number: u32,
    pub zone_count: u32,
    pub sector: u64,
    pub sector_count: u64,
    pub path: FixedStr<PATH_MAX>,
}

impl RequestHeader {
    pub fn new(id: RequestId) -> Self {
        Self {
            id: id as u32,
            zone_number: 0,
            zone_count: 0,
            sector: 0,
            sector_count: 0,
            path: FixedStr::default(),
        }
    }

    pub fn with_zones(mut self, zone_number: u32, zone_count: u32) -> Self {
        self.zone_number = zone_number;
        self.zone_count = zone_count;
        self
    }

    pub fn with_range(mut self, sector: u64, sector_count: u64) -> Self {
        self.sector = sector;
        self.sector_count = sector_count;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = FixedStr::new(path.into());
        self
    }

    /// Validated request id, or `Protocol`-class error if unrecognized.
    pub fn request_id(&self) -> Result<RequestId, WireError> {
        RequestId::try_from(self.id)
    }
}

/// Fixed-shape reply header.
///
/// `err` is a positive errno-like code; it is zero iff the request
/// succeeded, in which case `data_size` gives the length of the payload
/// that immediately follows on the wire.
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(big, magic(b"zone"))]
pub struct ReplyHeader {
    pub id: u32,
    pub err: u32,
    pub data_size: u32,
}

impl ReplyHeader {
    pub fn ok(id: RequestId, data_size: u32) -> Self {
        Self {
            id: id as u32,
            err: 0,
            data_size,
        }
    }

    pub fn error(id: RequestId, err: u32) -> Self {
        Self {
            id: id as u32,
            err,
            data_size: 0,
        }
    }

    /// Validates that this reply answers the expected request and carries
    /// no error, returning the announced payload size on success.
    pub fn expect(&self, id: RequestId) -> Result<u32, WireError> {
        if self.id != id as u32 {
            return Err(WireError::IdMismatch {
                expected: id as u32,
                got: self.id,
            });
        }
        Ok(self.data_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn request_header_round_trips() {
        let req = RequestHeader::new(RequestId::DevRepZones)
            .with_zones(3, 7)
            .with_range(0, 0)
            .with_path("/mnt/data");
        let mut buf = Vec::new();
        req.write(&mut Cursor::new(&mut buf)).unwrap();
        let back = RequestHeader::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(req, back);
    }

    #[test]
    fn magic_is_ascii_zone() {
        let req = RequestHeader::new(RequestId::MntdirInfo);
        let mut buf = Vec::new();
        req.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(&buf[0..4], b"zone");
    }

    #[test]
    fn reply_header_rejects_bad_magic() {
        let mut buf = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        let err = ReplyHeader::read(&mut Cursor::new(&buf)).unwrap_err();
        assert!(matches!(err, binrw::Error::BadMagic { .. }));
    }

    #[test]
    fn reply_expect_checks_id() {
        let rep = ReplyHeader::ok(RequestId::DevInfo, 12);
        assert_eq!(rep.expect(RequestId::DevInfo).unwrap(), 12);
        assert!(rep.expect(RequestId::Blockgroups).is_err());
    }
}
