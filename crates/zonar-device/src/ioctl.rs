//! Raw block-device ioctl bindings.
//!
//! No published crate in this workspace's stack wraps `linux/fs.h` and
//! `linux/blkzoned.h`, so the request numbers are derived by hand from the
//! kernel headers using `nix`'s ioctl macros, the same approach
//! `libcitadel`'s `blockdev` module uses for `BLKGETSIZE64`.

use std::mem;
use std::os::unix::io::RawFd;

use nix::{ioctl_read, ioctl_readwrite};

use crate::error::{DeviceError, Result};

ioctl_read!(blksszget, 0x12, 104, libc::c_int);
ioctl_read!(blkpbszget, 0x12, 123, libc::c_int);
ioctl_read!(blkgetsize64, 0x12, 114, u64);

/// Mirrors the kernel's `struct blk_zone`. Field layout matches
/// `linux/blkzoned.h`; only the fields the probe consumes are named, the
/// rest is kept as raw reserved bytes so the struct's size and alignment
/// match what the kernel expects to write into.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawBlkZone {
    pub start: u64,
    pub len: u64,
    pub wp: u64,
    pub ty: u8,
    pub cond: u8,
    pub non_seq: u8,
    pub reset: u8,
    pub resv: [u8; 4],
    pub capacity: u64,
    pub reserved: [u8; 24],
}

/// Mirrors `struct blk_zone_report`: a header immediately followed by
/// `nr_zones` [`RawBlkZone`] entries.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawBlkZoneReportHeader {
    pub sector: u64,
    pub nr_zones: u32,
    pub flags: u32,
}

pub const BLK_ZONE_REP_CACHED: u32 = 1 << 31;

ioctl_readwrite!(blkreportzone, 0x12, 130, RawBlkZoneReportHeader);
ioctl_readwrite!(blkreportzonev2, 0x12, 142, RawBlkZoneReportHeader);

fn nix_io_error(errno: nix::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

pub fn get_logical_block_size(fd: RawFd) -> Result<u32> {
    let mut val: libc::c_int = 0;
    unsafe { blksszget(fd, &mut val) }.map_err(|e| DeviceError::Io("BLKSSZGET", nix_io_error(e)))?;
    Ok(val as u32)
}

pub fn get_physical_block_size(fd: RawFd) -> Result<u32> {
    let mut val: libc::c_int = 0;
    unsafe { blkpbszget(fd, &mut val) }.map_err(|e| DeviceError::Io("BLKPBSZGET", nix_io_error(e)))?;
    Ok(val as u32)
}

pub fn get_size64(fd: RawFd) -> Result<u64> {
    let mut val: u64 = 0;
    unsafe { blkgetsize64(fd, &mut val) }.map_err(|e| DeviceError::Io("BLKGETSIZE64", nix_io_error(e)))?;
    Ok(val)
}

/// Issues one zone-report ioctl for up to `nr_zones` zones starting at
/// `sector`, preferring the cached `V2` variant and falling back to the
/// legacy one if the kernel rejects it with `ENOTTY`.
///
/// Returns the raw zone records the kernel filled in.
pub fn report_zones_raw(fd: RawFd, sector: u64, nr_zones: u32) -> Result<Vec<RawBlkZone>> {
    let header_size = mem::size_of::<RawBlkZoneReportHeader>();
    let zone_size = mem::size_of::<RawBlkZone>();
    let mut buf = vec![0u8; header_size + zone_size * nr_zones as usize];

    {
        let header = unsafe { &mut *(buf.as_mut_ptr() as *mut RawBlkZoneReportHeader) };
        header.sector = sector;
        header.nr_zones = nr_zones;
        header.flags = BLK_ZONE_REP_CACHED;
    }

    let header_ptr = buf.as_mut_ptr() as *mut RawBlkZoneReportHeader;
    let result = unsafe { blkreportzonev2(fd, header_ptr) };

    let used_legacy = match result {
        Ok(_) => false,
        Err(nix::Error::ENOTTY) => {
            let header = unsafe { &mut *header_ptr };
            header.sector = sector;
            header.nr_zones = nr_zones;
            header.flags = 0;
            unsafe { blkreportzone(fd, header_ptr) }
                .map_err(|e| DeviceError::Io("BLKREPORTZONE", nix_io_error(e)))?;
            true
        }
        Err(e) => return Err(DeviceError::Io("BLKREPORTZONEV2", nix_io_error(e))),
    };
    let _ = used_legacy;

    let header = unsafe { &*header_ptr };
    let returned = header.nr_zones as usize;
    let zones_ptr = unsafe { buf.as_ptr().add(header_size) as *const RawBlkZone };
    let zones = unsafe { std::slice::from_raw_parts(zones_ptr, returned) };
    Ok(zones.to_vec())
}
