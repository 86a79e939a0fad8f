//! Device open and zone-report operations.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use log::debug;

use crate::error::{DeviceError, Result};
use crate::ioctl;
use crate::sysfs;
use crate::types::{DeviceDescriptor, Zone, ZoneCondition, ZoneType};

/// Maximum number of zones fetched in a single ioctl call.
pub const REPORT_MAX_ZONES: u32 = 8192;

/// An open, probed zoned or conventional block device.
pub struct Device {
    file: File,
    pub descriptor: DeviceDescriptor,
}

impl Device {
    /// Resolves symlinks, opens the device read-only, and reads its
    /// geometry from sysfs and block ioctls.
    pub fn open(device_path: &Path) -> Result<Self> {
        let (real_path, devname) = sysfs::canonical_devname(device_path)?;

        let file = File::open(&real_path)?;
        let fd = file.as_raw_fd();

        let is_zoned = sysfs::is_zoned(&devname)?;
        let lblock_size = ioctl::get_logical_block_size(fd)?;
        if lblock_size == 0 {
            return Err(DeviceError::InvalidGeometry(format!(
                "invalid logical sector size for {devname}"
            )));
        }
        let pblock_size = ioctl::get_physical_block_size(fd)?;
        if pblock_size == 0 {
            return Err(DeviceError::InvalidGeometry(format!(
                "invalid physical sector size for {devname}"
            )));
        }

        let size_bytes = ioctl::get_size64(fd)?;
        let nr_sectors = size_bytes >> 9;
        let nr_lblocks = size_bytes / lblock_size as u64;
        if nr_lblocks == 0 {
            return Err(DeviceError::InvalidGeometry(format!(
                "invalid capacity (logical blocks) for {devname}"
            )));
        }
        let nr_pblocks = size_bytes / pblock_size as u64;
        if nr_pblocks == 0 {
            return Err(DeviceError::InvalidGeometry(format!(
                "invalid capacity (physical blocks) for {devname}"
            )));
        }

        let (zone_sectors, nr_zones) = if is_zoned {
            (sysfs::zone_sectors(&devname)?, sysfs::nr_zones(&devname)?)
        } else {
            (0, 0)
        };
        let zone_size = (zone_sectors as u64) << 9;

        let max_nr_open_zones = sysfs::max_open_zones(&devname);
        let max_nr_active_zones = sysfs::max_active_zones(&devname);
        let vendor_id = sysfs::vendor_id(&devname);

        debug!(
            "opened device {} ({} sectors, zoned={})",
            real_path.display(),
            nr_sectors,
            is_zoned
        );

        Ok(Self {
            file,
            descriptor: DeviceDescriptor {
                path: real_path.display().to_string(),
                vendor_id,
                nr_sectors,
                nr_lblocks,
                nr_pblocks,
                zone_size,
                zone_sectors,
                lblock_size,
                pblock_size,
                nr_zones,
                max_nr_open_zones,
                max_nr_active_zones,
                is_zoned,
            },
        })
    }

    /// Fills `count` zones starting at `start_zone_index`, batching the
    /// underlying ioctl by up to [`REPORT_MAX_ZONES`] zones per call.
    ///
    /// Returns the number of zones actually filled, which can be less
    /// than `count` if the device runs out of zones first.
    pub fn report_zones(&self, start_zone_index: u32, count: u32) -> Result<Vec<Zone>> {
        if count == 0 || start_zone_index >= self.descriptor.nr_zones {
            return Err(DeviceError::Invalid(format!(
                "report_zones(start={start_zone_index}, count={count}) out of range for {} zones",
                self.descriptor.nr_zones
            )));
        }

        let fd = self.file.as_raw_fd();
        let mut sector = self.descriptor.zone_sectors as u64 * start_zone_index as u64;
        let end_sector = self.descriptor.nr_sectors;

        let mut zones = Vec::with_capacity(count as usize);
        while (zones.len() as u32) < count && sector < end_sector {
            let remaining = count - zones.len() as u32;
            let batch = remaining.min(REPORT_MAX_ZONES);
            let raw = ioctl::report_zones_raw(fd, sector, batch)?;
            if raw.is_empty() {
                break;
            }
            for rz in raw {
                if (zones.len() as u32) >= count || sector >= end_sector {
                    break;
                }
                zones.push(convert_zone(&rz));
                sector = rz.start + rz.len;
            }
        }

        Ok(zones)
    }
}

fn convert_zone(rz: &ioctl::RawBlkZone) -> Zone {
    Zone {
        start: rz.start,
        len: rz.len,
        wp: rz.wp,
        capacity: rz.capacity,
        ty: match rz.ty {
            1 => ZoneType::Conventional,
            2 => ZoneType::SeqWriteRequired,
            3 => ZoneType::SeqWritePreferred,
            _ => ZoneType::Conventional,
        },
        cond: match rz.cond {
            0x0 => ZoneCondition::NotWp,
            0x1 => ZoneCondition::Empty,
            0x2 => ZoneCondition::ImplicitOpen,
            0x3 => ZoneCondition::ExplicitOpen,
            0x4 => ZoneCondition::Closed,
            0xD => ZoneCondition::ReadOnly,
            0xE => ZoneCondition::Full,
            0xF => ZoneCondition::Offline,
            0xFF => ZoneCondition::Active,
            _ => ZoneCondition::NotWp,
        },
    }
}
