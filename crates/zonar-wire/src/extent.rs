//! Wire record for one extent, shared by `FILE_EXTENTS` and
//! `EXTENTS_IN_RANGE` replies.

use binrw::prelude::*;

use crate::fixed_str::FixedStr;
use crate::ANNOTATION_LEN;

/// Distinguishes an extent obtained from a file's own extent map from one
/// obtained via a reverse sector-range map.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(repr(u8))]
pub enum ExtentTag {
    FileExtent = 0,
    ZoneExtent = 1,
}

/// One extent as carried on the wire.
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(big)]
pub struct ExtentRecord {
    pub tag: ExtentTag,
    pub idx: u32,
    pub ino: u64,
    pub sector: u64,
    pub nr_sectors: u64,
    pub info: FixedStr<ANNOTATION_LEN>,
}

impl ExtentRecord {
    /// Byte length of one packed record on the wire: 1 + 4 + 8 + 8 + 8 +
    /// `ANNOTATION_LEN`.
    pub const WIRE_SIZE: usize = 1 + 4 + 8 + 8 + 8 + ANNOTATION_LEN;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn extent_record_round_trips() {
        let ext = ExtentRecord {
            tag: ExtentTag::ZoneExtent,
            idx: 3,
            ino: 128,
            sector: 1000,
            nr_sectors: 200,
            info: FixedStr::new("sector=[1000,1200) ag=0"),
        };
        let mut buf = Vec::new();
        ext.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), ExtentRecord::WIRE_SIZE);
        let back = ExtentRecord::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(ext, back);
    }
}
