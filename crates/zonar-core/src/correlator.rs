//! Correlates a device's zone report with a filesystem's blockgroups.
//!
//! A blockgroup's sector range rarely aligns with zone boundaries: a
//! conventional zone can span several blockgroups, and a blockgroup can
//! span several zones. For each blockgroup we walk the zone array
//! forward from roughly where the previous blockgroup left off, backing
//! up by one zone first in case the previous blockgroup's last zone
//! also covers the start of this one.

use zonar_device::{DeviceDescriptor, Zone, ZoneType};
use zonar_fs::{Blockgroup, BlockgroupType};
use zonar_wire::MAX_ZONES_PER_BLOCKGROUP;

use crate::error::{CoreError, Result};

/// Computes the zone-number span `[z0, z1)` that covers the full
/// blockgroup array, i.e. the range a caller must re-read with
/// `report_zones` before calling [`refresh`] on a quiescent-but-possibly-
/// stale zone array. Fails with `Invalid` if the span reaches past the
/// device's own zone count.
pub fn zone_span(blockgroups: &[Blockgroup], zone_sectors: u32, zone_count: u32) -> Result<(u32, u32)> {
    let (Some(first), Some(last)) = (blockgroups.first(), blockgroups.last()) else {
        return Ok((0, 0));
    };
    let zone_sectors = zone_sectors as u64;
    let z0 = (first.sector / zone_sectors) as u32;
    let z1 = last.end_sector().div_ceil(zone_sectors) as u32;
    if z1 > zone_count {
        return Err(CoreError::Invalid(format!(
            "blockgroup array spans zone {z1} but device only has {zone_count} zones"
        )));
    }
    Ok((z0, z1))
}

/// Recomputes every blockgroup's `flags`, `wp_sector`, and `zones` index
/// list from the device's zone report.
///
/// A non-zoned device has no zones to correlate: every blockgroup is
/// simply marked conventional with no write pointer.
pub fn refresh(device: &DeviceDescriptor, zones: &[Zone], blockgroups: &mut [Blockgroup]) -> Result<u32> {
    if !device.is_zoned {
        for bg in blockgroups.iter_mut() {
            bg.flags = BlockgroupType::Conventional;
            bg.wp_sector = 0;
            bg.zones.clear();
        }
        return Ok(blockgroups.len() as u32);
    }

    let mut zone_cursor = 0usize;

    for bg in blockgroups.iter_mut() {
        bg.zones.clear();
        bg.wp_sector = 0;
        bg.flags = BlockgroupType::Unset;

        let bg_start = bg.sector;
        let bg_end = bg.end_sector();

        // Back up one zone from where the previous blockgroup stopped:
        // a conventional zone spanning a blockgroup boundary must still
        // be considered for this blockgroup too.
        let mut j = if zone_cursor > 1 { zone_cursor - 1 } else { 0 };

        while j < zones.len() {
            let zone = &zones[j];

            if zone.end() <= bg_start {
                j += 1;
                continue;
            }
            if zone.start >= bg_end {
                break;
            }

            if bg.zones.len() >= MAX_ZONES_PER_BLOCKGROUP {
                return Err(CoreError::Invalid(format!(
                    "blockgroup at sector {bg_start} overlaps more than {MAX_ZONES_PER_BLOCKGROUP} zones"
                )));
            }

            if bg.flags == BlockgroupType::Unset {
                bg.flags = match zone.ty {
                    ZoneType::Conventional => BlockgroupType::Conventional,
                    ZoneType::SeqWriteRequired => BlockgroupType::SeqWriteRequired,
                    ZoneType::SeqWritePreferred => BlockgroupType::SeqWritePreferred,
                };
                // Only the *first* mapped zone's write pointer matters,
                // and only for seq-write-required blockgroups; it is
                // expressed relative to the blockgroup's own start, not
                // the zone's.
                if zone.ty == ZoneType::SeqWriteRequired {
                    bg.wp_sector = zone.wp.saturating_sub(bg_start);
                }
            }

            bg.zones.push(j);
            zone_cursor = j;
            j += 1;
        }

        if bg.zones.is_empty() {
            return Err(CoreError::Invalid(format!(
                "no zone overlaps blockgroup at sector {bg_start}"
            )));
        }
    }

    Ok(blockgroups.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonar_device::ZoneCondition;

    fn descriptor(is_zoned: bool) -> DeviceDescriptor {
        DeviceDescriptor {
            path: "/dev/test".into(),
            vendor_id: "test".into(),
            nr_sectors: 4096,
            nr_lblocks: 4096,
            nr_pblocks: 4096,
            zone_size: 1024,
            zone_sectors: 1024,
            lblock_size: 512,
            pblock_size: 512,
            nr_zones: 4,
            max_nr_open_zones: 0,
            max_nr_active_zones: 0,
            is_zoned,
        }
    }

    fn zone(start: u64, len: u64, ty: ZoneType, wp: u64) -> Zone {
        Zone {
            start,
            len,
            wp,
            capacity: len,
            ty,
            cond: ZoneCondition::ImplicitOpen,
        }
    }

    #[test]
    fn non_zoned_device_marks_everything_conventional() {
        let device = descriptor(false);
        let mut bgs = vec![Blockgroup::uncorrelated(0, 2048)];
        refresh(&device, &[], &mut bgs).unwrap();
        assert_eq!(bgs[0].flags, BlockgroupType::Conventional);
        assert!(bgs[0].zones.is_empty());
    }

    #[test]
    fn blockgroup_spanning_two_zones_records_both() {
        let device = descriptor(true);
        let zones = vec![
            zone(0, 1024, ZoneType::Conventional, 0),
            zone(1024, 1024, ZoneType::SeqWriteRequired, 1536),
        ];
        let mut bgs = vec![Blockgroup::uncorrelated(512, 1024)];
        refresh(&device, &zones, &mut bgs).unwrap();
        assert_eq!(bgs[0].zones, vec![0, 1]);
        assert_eq!(bgs[0].flags, BlockgroupType::Conventional);
        assert_eq!(bgs[0].wp_sector, 0);
    }

    #[test]
    fn wp_sector_is_relative_to_blockgroup_start() {
        let device = descriptor(true);
        let zones = vec![
            zone(0, 1024, ZoneType::SeqWriteRequired, 0),
            zone(1024, 1024, ZoneType::SeqWriteRequired, 1536),
        ];
        let mut bgs = vec![Blockgroup::uncorrelated(512, 1024)];
        refresh(&device, &zones, &mut bgs).unwrap();
        assert_eq!(bgs[0].zones, vec![0, 1]);
        assert_eq!(bgs[0].flags, BlockgroupType::SeqWriteRequired);
        assert_eq!(bgs[0].wp_sector, zones[0].wp.saturating_sub(512));
    }

    #[test]
    fn conventional_zone_spans_blockgroup_boundary() {
        let device = descriptor(true);
        let zones = vec![zone(0, 4096, ZoneType::Conventional, 0)];
        let mut bgs = vec![
            Blockgroup::uncorrelated(0, 1024),
            Blockgroup::uncorrelated(1024, 1024),
            Blockgroup::uncorrelated(2048, 1024),
        ];
        refresh(&device, &zones, &mut bgs).unwrap();
        for bg in &bgs {
            assert_eq!(bg.zones, vec![0]);
            assert_eq!(bg.flags, BlockgroupType::Conventional);
        }
    }

    #[test]
    fn blockgroup_with_no_overlapping_zone_is_invalid() {
        let device = descriptor(true);
        let zones = vec![zone(0, 1024, ZoneType::Conventional, 0)];
        let mut bgs = vec![Blockgroup::uncorrelated(2048, 1024)];
        let err = refresh(&device, &zones, &mut bgs).unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
    }

    #[test]
    fn zone_span_covers_full_blockgroup_range() {
        let bgs = vec![
            Blockgroup::uncorrelated(1024, 1024),
            Blockgroup::uncorrelated(2048, 2048),
        ];
        let (z0, z1) = zone_span(&bgs, 1024, 8).unwrap();
        assert_eq!((z0, z1), (1, 4));
    }

    #[test]
    fn zone_span_rejects_span_beyond_zone_count() {
        let bgs = vec![Blockgroup::uncorrelated(0, 4096)];
        let err = zone_span(&bgs, 1024, 2).unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
    }

    #[test]
    fn zone_span_of_empty_blockgroups_is_empty() {
        assert_eq!(zone_span(&[], 1024, 8).unwrap(), (0, 0));
    }
}
