//! Wire record for one device zone.
//!
//! Mirrors the shape of the kernel's zone report (`struct blk_zone`), with
//! the multi-byte fields re-serialized in network order rather than copied
//! as a raw host-endian struct.

use binrw::prelude::*;

/// Zone type, matching `BLK_ZONE_TYPE_*`.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(repr(u8))]
pub enum ZoneType {
    Conventional = 1,
    SeqWriteRequired = 2,
    SeqWritePreferred = 3,
}

/// Zone condition, matching `BLK_ZONE_COND_*`.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(repr(u8))]
pub enum ZoneCondition {
    NotWp = 0x0,
    Empty = 0x1,
    ImplicitOpen = 0x2,
    ExplicitOpen = 0x3,
    Closed = 0x4,
    ReadOnly = 0xD,
    Full = 0xE,
    Offline = 0xF,
    Active = 0xFF,
}

/// One zone as carried on the wire by `DEV_REP_ZONES`.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(big)]
pub struct ZoneRecord {
    pub start: u64,
    pub len: u64,
    pub wp: u64,
    pub capacity: u64,
    pub type_: ZoneType,
    pub cond: ZoneCondition,
    pub non_seq: u8,
    pub reset: u8,
}

impl ZoneRecord {
    /// Byte length of one packed record on the wire: 8*4 + 1*4.
    pub const WIRE_SIZE: usize = 8 * 4 + 4;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn zone_record_round_trips() {
        let z = ZoneRecord {
            start: 0,
            len: 524288,
            wp: 1024,
            capacity: 524288,
            type_: ZoneType::SeqWriteRequired,
            cond: ZoneCondition::ImplicitOpen,
            non_seq: 0,
            reset: 0,
        };
        let mut buf = Vec::new();
        z.write(&mut Cursor::new(&mut buf)).unwrap();
        let back = ZoneRecord::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(z, back);
    }
}
