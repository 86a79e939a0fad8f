//! `MNTDIR_INFO` and `DEV_INFO` reply payloads.

use binrw::prelude::*;

use crate::fixed_str::FixedStr;
use crate::PATH_MAX;

/// Length, in bytes, of the vendor/model/revision identification string
/// before the NUL terminator.
pub const VENDOR_ID_LEN: usize = 32;

/// `MNTDIR_INFO` reply payload.
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(big)]
pub struct MntdirInfoReply {
    pub fs_type: u32,
    pub mount_path: FixedStr<PATH_MAX>,
}

/// `DEV_INFO` reply payload.
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq, Eq)]
#[brw(big)]
pub struct DevInfoReply {
    pub path: FixedStr<PATH_MAX>,
    pub vendor_id: FixedStr<{ VENDOR_ID_LEN + 1 }>,
    pub nr_sectors: u64,
    pub nr_lblocks: u64,
    pub nr_pblocks: u64,
    pub zone_size: u64,
    pub zone_sectors: u32,
    pub lblock_size: u32,
    pub pblock_size: u32,
    pub nr_zones: u32,
    pub max_nr_open_zones: u32,
    pub max_nr_active_zones: u32,
    pub is_zoned: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn dev_info_round_trips() {
        let rep = DevInfoReply {
            path: FixedStr::new("/dev/nvme0n1"),
            vendor_id: FixedStr::new("ACME  NVMe SSD"),
            nr_sectors: 0x1234_5678_9ABC_DEF0,
            nr_lblocks: 1 << 20,
            nr_pblocks: 1 << 20,
            zone_size: 256 << 20,
            zone_sectors: 524288,
            lblock_size: 512,
            pblock_size: 4096,
            nr_zones: 32,
            max_nr_open_zones: 8,
            max_nr_active_zones: 16,
            is_zoned: 1,
        };
        let mut buf = Vec::new();
        rep.write(&mut Cursor::new(&mut buf)).unwrap();
        let back = DevInfoReply::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(rep, back);
    }
}
