//! Wire record for one blockgroup, carried by the `BLOCKGROUPS` reply.
//! A `BLOCKGROUPS` request is answered with two successive replies: a
//! count, then the packed record array.

use binrw::prelude::*;

use crate::MAX_ZONES_PER_BLOCKGROUP;

/// One blockgroup as carried on the wire.
///
/// The `zones` slot array is transmitted but opaque: it is always sent as
/// zero and the receiver recomputes the zone/blockgroup mapping itself
/// rather than trusting pointers serialized by the sender (see the
/// correlator in `zonar-core`).
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(big)]
pub struct BlockgroupRecord {
    pub sector: u64,
    pub nr_sectors: u64,
    pub wp_sector: u64,
    pub flags: u32,
    #[br(count = MAX_ZONES_PER_BLOCKGROUP)]
    pub zones: Vec<u64>,
    pub nr_zones: u64,
}

impl BlockgroupRecord {
    /// Byte length of one packed record on the wire.
    pub const WIRE_SIZE: usize = 8 + 8 + 8 + 4 + MAX_ZONES_PER_BLOCKGROUP * 8 + 8;

    pub fn opaque(sector: u64, nr_sectors: u64, wp_sector: u64, flags: u32, nr_zones: u64) -> Self {
        Self {
            sector,
            nr_sectors,
            wp_sector,
            flags,
            zones: vec![0u64; MAX_ZONES_PER_BLOCKGROUP],
            nr_zones,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blockgroup_record_round_trips() {
        let bg = BlockgroupRecord::opaque(0, 524288, 0, 1, 2);
        let mut buf = Vec::new();
        bg.write(&mut Cursor::new(&mut buf)).unwrap();
        assert_eq!(buf.len(), BlockgroupRecord::WIRE_SIZE);
        let back = BlockgroupRecord::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(bg, back);
    }
}
