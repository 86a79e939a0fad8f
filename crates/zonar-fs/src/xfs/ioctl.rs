//! Raw XFS ioctl bindings.
//!
//! No `xfs-sys` crate is part of this workspace's stack, so these mirror
//! only the fields the provider actually reads from `xfs/xfs_fs.h` and
//! `linux/fsmap.h`; unused kernel fields are kept as reserved padding so
//! each struct's size matches what the ioctl expects to fill in.

use std::os::unix::io::RawFd;

use nix::{ioctl_read, ioctl_readwrite};

use crate::error::{FsError, Result};

fn nix_io_error(errno: nix::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

/// Mirrors `struct xfs_fsop_geom` (xfs/xfs_fs.h), fields relevant to
/// blockgroup and extent enumeration only.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct XfsFsopGeom {
    pub blocksize: u32,
    pub rtextsize: u32,
    pub agblocks: u32,
    pub agcount: u32,
    pub logblocks: u32,
    pub sectsize: u32,
    pub inodesize: u32,
    pub imaxpct: u32,
    pub datablocks: u64,
    pub rtblocks: u64,
    pub rtextents: u64,
    pub logstart: u64,
    pub uuid: [u8; 16],
    pub sunit: u32,
    pub swidth: u32,
    pub version: i32,
    pub flags: u32,
    pub logsectsize: u32,
    pub rtsectsize: u32,
    pub dirblocksize: u32,
    pub rtstart: u64,
    pub rgcount: u32,
    pub rgextents: u32,
    pub reserved: [u32; 16],
}

ioctl_read!(xfs_ioc_fsgeometry, 0x58, 51, XfsFsopGeom);

pub fn get_fs_geometry(fd: RawFd) -> Result<XfsFsopGeom> {
    let mut geo = XfsFsopGeom::default();
    unsafe { xfs_ioc_fsgeometry(fd, &mut geo) }
        .map_err(|e| FsError::Io("XFS_IOC_FSGEOMETRY", nix_io_error(e)))?;
    Ok(geo)
}

/// Mirrors `struct fsxattr` (linux/fs.h), extended attribute flags and
/// extent count of one file.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FsXAttr {
    pub fsx_xflags: u32,
    pub fsx_extsize: u32,
    pub fsx_nextents: u32,
    pub fsx_projid: u32,
    pub fsx_cowextsize: u32,
    pub fsx_pad: [u8; 8],
}

/// `FS_XFLAG_REALTIME`, from `linux/fs.h`.
pub const FS_XFLAG_REALTIME: u32 = 0x00000001;

ioctl_read!(fs_ioc_fsgetxattr, b'X', 31, FsXAttr);

pub fn get_fsxattr(fd: RawFd) -> Result<FsXAttr> {
    let mut fsx = FsXAttr::default();
    unsafe { fs_ioc_fsgetxattr(fd, &mut fsx) }
        .map_err(|e| FsError::Io("FS_IOC_FSGETXATTR", nix_io_error(e)))?;
    Ok(fsx)
}

/// Mirrors one `struct getbmapx` entry (xfs/xfs_fs.h).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct GetBmapX {
    pub bmv_offset: i64,
    pub bmv_block: i64,
    pub bmv_length: i64,
    pub bmv_count: i32,
    pub bmv_entries: i32,
    pub bmv_iflags: i32,
    pub bmv_oflags: i32,
    pub bmv_unused1: i32,
    pub bmv_unused2: i32,
}

ioctl_readwrite!(xfs_ioc_getbmapx, b'X', 56, GetBmapX);

/// Issues `XFS_IOC_GETBMAPX` on `fd` with a header plus `entry_count`
/// zeroed entries, returning the kernel-filled buffer (header at index
/// 0, one entry per extent thereafter).
pub fn get_bmapx(fd: RawFd, entry_count: usize) -> Result<Vec<GetBmapX>> {
    let mut map = vec![GetBmapX::default(); entry_count + 1];
    map[0].bmv_length = -1;
    map[0].bmv_count = (entry_count + 1) as i32;
    let header_ptr = map.as_mut_ptr();
    unsafe { xfs_ioc_getbmapx(fd, header_ptr) }
        .map_err(|e| FsError::Io("XFS_IOC_GETBMAPX", nix_io_error(e)))?;
    Ok(map)
}

/// Mirrors `struct fsmap` (linux/fsmap.h), one reverse-map record.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMap {
    pub fmr_device: u32,
    pub fmr_flags: u32,
    pub fmr_physical: u64,
    pub fmr_owner: u64,
    pub fmr_offset: u64,
    pub fmr_length: u64,
    pub fmr_reserved: [u64; 3],
}

/// `FMR_OF_SPECIAL_OWNER` / `FMR_OF_LAST`, from `linux/fsmap.h`.
pub const FMR_OF_SPECIAL_OWNER: u32 = 1 << 0;
pub const FMR_OF_LAST: u32 = 1 << 1;

pub const XFS_DEV_DATA: u32 = 0;
pub const XFS_DEV_RT: u32 = 2;

/// Mirrors `struct fsmap_head` (linux/fsmap.h): a query header with two
/// key records (`fmh_keys[0]` = low, `fmh_keys[1]` = high) followed by
/// `fmh_count` result records.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct FsMapHead {
    pub fmh_iflags: u32,
    pub fmh_oflags: u32,
    pub fmh_count: u32,
    pub fmh_entries: u32,
    pub fmh_reserved: [u64; 6],
    pub fmh_keys: [FsMap; 2],
    pub fmh_recs: Vec<FsMap>,
}

impl FsMapHead {
    pub fn with_capacity(count: u32) -> Self {
        Self {
            fmh_iflags: 0,
            fmh_oflags: 0,
            fmh_count: count,
            fmh_entries: 0,
            fmh_reserved: [0; 6],
            fmh_keys: [FsMap::default(); 2],
            fmh_recs: vec![FsMap::default(); count as usize],
        }
    }
}

/// Size of the fixed portion of `struct fsmap_head` (everything up to
/// and including the two key records) — the kernel's ioctl request
/// number is derived from this fixed size regardless of how many result
/// records follow, since the real struct ends in a flexible array
/// member.
const FSMAP_HEAD_FIXED_SIZE: usize = 16 + 8 * 6 + std::mem::size_of::<FsMap>() * 2;

const fn ioc(dir: u32, ty: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((dir as libc::c_ulong) << 30)
        | ((ty as libc::c_ulong) << 8)
        | (nr as libc::c_ulong)
        | ((size as libc::c_ulong) << 16)
}

const IOC_READ_WRITE: u32 = 3;

/// `FS_IOC_GETFSMAP` takes a variable-length buffer (header + N records)
/// that cannot be expressed as one `#[repr(C)]` type bound to an ioctl
/// macro, so the call is issued directly against a flattened byte
/// buffer built from `head`, with the request number derived from the
/// fixed-size header the same way the kernel's own macro does.
pub fn get_fsmap(fd: RawFd, head: &mut FsMapHead) -> Result<()> {
    let rec_size = std::mem::size_of::<FsMap>();
    let mut buf = vec![0u8; FSMAP_HEAD_FIXED_SIZE + rec_size * head.fmh_recs.len()];

    unsafe {
        let p = buf.as_mut_ptr();
        std::ptr::write_unaligned(p as *mut u32, head.fmh_iflags);
        std::ptr::write_unaligned(p.add(4) as *mut u32, head.fmh_oflags);
        std::ptr::write_unaligned(p.add(8) as *mut u32, head.fmh_count);
        std::ptr::write_unaligned(p.add(12) as *mut u32, head.fmh_entries);
        let keys_off = 16 + 8 * 6;
        std::ptr::write_unaligned(p.add(keys_off) as *mut [FsMap; 2], head.fmh_keys);
    }

    let request = ioc(IOC_READ_WRITE, b'X', 59, FSMAP_HEAD_FIXED_SIZE);
    let ret = unsafe { libc::ioctl(fd, request, buf.as_mut_ptr()) };
    if ret < 0 {
        return Err(FsError::Io(
            "FS_IOC_GETFSMAP",
            std::io::Error::last_os_error(),
        ));
    }

    unsafe {
        let p = buf.as_ptr();
        head.fmh_oflags = std::ptr::read_unaligned(p.add(4) as *const u32);
        head.fmh_count = std::ptr::read_unaligned(p.add(8) as *const u32);
        head.fmh_entries = std::ptr::read_unaligned(p.add(12) as *const u32);
        let keys_off = 16 + 8 * 6;
        let recs_off = keys_off + rec_size * 2;
        let recs_ptr = p.add(recs_off) as *const FsMap;
        for (i, rec) in head.fmh_recs.iter_mut().enumerate() {
            *rec = std::ptr::read_unaligned(recs_ptr.add(i));
        }
    }

    Ok(())
}
