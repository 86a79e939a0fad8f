//! Conversions between the wire records in `zonar-wire` and the domain
//! types the rest of the crate (and its callers) work with.
//!
//! Kept in one place so the transport modules only ever deal in domain
//! types, matching how `znr_net.c`'s senders/receivers are the only code
//! that ever touches the wire layout directly.

use zonar_device::{DeviceDescriptor, Zone, ZoneCondition as DevZoneCondition, ZoneType as DevZoneType};
use zonar_fs::{Blockgroup, BlockgroupType, Extent, ExtentTag as FsExtentTag};
use zonar_wire::{
    BlockgroupRecord, DevInfoReply, ExtentRecord, ExtentTag as WireExtentTag, FixedStr,
    ZoneCondition as WireZoneCondition, ZoneRecord, ZoneType as WireZoneType,
};

pub fn zone_to_wire(z: &Zone) -> ZoneRecord {
    ZoneRecord {
        start: z.start,
        len: z.len,
        wp: z.wp,
        capacity: z.capacity,
        type_: match z.ty {
            DevZoneType::Conventional => WireZoneType::Conventional,
            DevZoneType::SeqWriteRequired => WireZoneType::SeqWriteRequired,
            DevZoneType::SeqWritePreferred => WireZoneType::SeqWritePreferred,
        },
        cond: match z.cond {
            DevZoneCondition::NotWp => WireZoneCondition::NotWp,
            DevZoneCondition::Empty => WireZoneCondition::Empty,
            DevZoneCondition::ImplicitOpen => WireZoneCondition::ImplicitOpen,
            DevZoneCondition::ExplicitOpen => WireZoneCondition::ExplicitOpen,
            DevZoneCondition::Closed => WireZoneCondition::Closed,
            DevZoneCondition::ReadOnly => WireZoneCondition::ReadOnly,
            DevZoneCondition::Full => WireZoneCondition::Full,
            DevZoneCondition::Offline => WireZoneCondition::Offline,
            DevZoneCondition::Active => WireZoneCondition::Active,
        },
        non_seq: 0,
        reset: 0,
    }
}

pub fn zone_from_wire(r: &ZoneRecord) -> Zone {
    Zone {
        start: r.start,
        len: r.len,
        wp: r.wp,
        capacity: r.capacity,
        ty: match r.type_ {
            WireZoneType::Conventional => DevZoneType::Conventional,
            WireZoneType::SeqWriteRequired => DevZoneType::SeqWriteRequired,
            WireZoneType::SeqWritePreferred => DevZoneType::SeqWritePreferred,
        },
        cond: match r.cond {
            WireZoneCondition::NotWp => DevZoneCondition::NotWp,
            WireZoneCondition::Empty => DevZoneCondition::Empty,
            WireZoneCondition::ImplicitOpen => DevZoneCondition::ImplicitOpen,
            WireZoneCondition::ExplicitOpen => DevZoneCondition::ExplicitOpen,
            WireZoneCondition::Closed => DevZoneCondition::Closed,
            WireZoneCondition::ReadOnly => DevZoneCondition::ReadOnly,
            WireZoneCondition::Full => DevZoneCondition::Full,
            WireZoneCondition::Offline => DevZoneCondition::Offline,
            WireZoneCondition::Active => DevZoneCondition::Active,
        },
    }
}

pub fn device_to_wire(d: &DeviceDescriptor) -> DevInfoReply {
    DevInfoReply {
        path: FixedStr::new(d.path.clone()),
        vendor_id: FixedStr::new(d.vendor_id.clone()),
        nr_sectors: d.nr_sectors,
        nr_lblocks: d.nr_lblocks,
        nr_pblocks: d.nr_pblocks,
        zone_size: d.zone_size,
        zone_sectors: d.zone_sectors,
        lblock_size: d.lblock_size,
        pblock_size: d.pblock_size,
        nr_zones: d.nr_zones,
        max_nr_open_zones: d.max_nr_open_zones,
        max_nr_active_zones: d.max_nr_active_zones,
        is_zoned: d.is_zoned as u8,
    }
}

pub fn device_from_wire(r: &DevInfoReply) -> DeviceDescriptor {
    DeviceDescriptor {
        path: r.path.as_str().to_string(),
        vendor_id: r.vendor_id.as_str().to_string(),
        nr_sectors: r.nr_sectors,
        nr_lblocks: r.nr_lblocks,
        nr_pblocks: r.nr_pblocks,
        zone_size: r.zone_size,
        zone_sectors: r.zone_sectors,
        lblock_size: r.lblock_size,
        pblock_size: r.pblock_size,
        nr_zones: r.nr_zones,
        max_nr_open_zones: r.max_nr_open_zones,
        max_nr_active_zones: r.max_nr_active_zones,
        is_zoned: r.is_zoned != 0,
    }
}

pub fn extent_to_wire(e: &Extent) -> ExtentRecord {
    ExtentRecord {
        tag: match e.tag {
            FsExtentTag::FileExtent => WireExtentTag::FileExtent,
            FsExtentTag::ZoneExtent => WireExtentTag::ZoneExtent,
        },
        idx: e.idx,
        ino: e.ino,
        sector: e.sector,
        nr_sectors: e.nr_sectors,
        info: FixedStr::new(e.info.clone()),
    }
}

pub fn extent_from_wire(r: &ExtentRecord) -> Extent {
    Extent {
        tag: match r.tag {
            WireExtentTag::FileExtent => FsExtentTag::FileExtent,
            WireExtentTag::ZoneExtent => FsExtentTag::ZoneExtent,
        },
        idx: r.idx,
        ino: r.ino,
        sector: r.sector,
        nr_sectors: r.nr_sectors,
        info: r.info.as_str().to_string(),
    }
}

fn blockgroup_type_to_u32(t: BlockgroupType) -> u32 {
    match t {
        BlockgroupType::Unset => 0,
        BlockgroupType::Conventional => 1,
        BlockgroupType::SeqWriteRequired => 2,
        BlockgroupType::SeqWritePreferred => 3,
    }
}

fn blockgroup_type_from_u32(v: u32) -> BlockgroupType {
    match v {
        1 => BlockgroupType::Conventional,
        2 => BlockgroupType::SeqWriteRequired,
        3 => BlockgroupType::SeqWritePreferred,
        _ => BlockgroupType::Unset,
    }
}

/// The `zones` slot array is always sent opaque (zero-filled); a
/// receiver reconstructs the index list itself by running the
/// correlator against its own zone report.
pub fn blockgroup_to_wire(bg: &Blockgroup) -> BlockgroupRecord {
    BlockgroupRecord::opaque(
        bg.sector,
        bg.nr_sectors,
        bg.wp_sector,
        blockgroup_type_to_u32(bg.flags),
        bg.zones.len() as u64,
    )
}

pub fn blockgroup_from_wire(r: &BlockgroupRecord) -> Blockgroup {
    Blockgroup {
        sector: r.sector,
        nr_sectors: r.nr_sectors,
        wp_sector: r.wp_sector,
        flags: blockgroup_type_from_u32(r.flags),
        zones: Vec::new(),
    }
}
