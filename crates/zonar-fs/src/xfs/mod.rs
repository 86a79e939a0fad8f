//! The XFS filesystem provider: extent-map two-pass query, reverse-map
//! paging, AG/RG blockgroup enumeration.

mod ioctl;

use std::fs::File;
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::blockgroup::Blockgroup;
use crate::error::{FsError, Result};
use crate::extent::{Extent, ExtentTag};
use crate::provider::{FsGeometry, FsProvider};

use ioctl::{FsMapHead, GetBmapX, FMR_OF_LAST, FMR_OF_SPECIAL_OWNER, FS_XFLAG_REALTIME, XFS_DEV_DATA, XFS_DEV_RT};

const SECTOR_SHIFT: u32 = 9;
const BBSIZE: u64 = 512;

/// Maximum once-only retry count for the extent-map query.
const BMAP_MAX_ATTEMPTS: usize = 2;

/// Size of the initial FSMAP count-probing query.
const FSMAP_INITIAL_COUNT: u32 = 512;

pub struct XfsProvider {
    mount_path: PathBuf,
    mount_fd: Option<std::os::fd::RawFd>,
    geometry: Mutex<FsGeometry>,
    raw_geometry: Mutex<ioctl::XfsFsopGeom>,
}

impl Default for XfsProvider {
    fn default() -> Self {
        Self {
            mount_path: PathBuf::new(),
            mount_fd: None,
            geometry: Mutex::new(FsGeometry::default()),
            raw_geometry: Mutex::new(ioctl::XfsFsopGeom::default()),
        }
    }
}

impl XfsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn bytes_per_rtgroup(geo: &ioctl::XfsFsopGeom) -> u64 {
        if geo.rgcount == 0 {
            return 0;
        }
        geo.rgextents as u64 * geo.rtextsize as u64 * geo.blocksize as u64
    }

    fn open_relative(&self, path: &str) -> Result<File> {
        let full = self.mount_path.join(path.trim_start_matches('/'));
        File::open(&full).map_err(FsError::from)
    }
}

impl FsProvider for XfsProvider {
    fn init(&mut self, mount_fd: std::os::fd::RawFd, mount_path: &str) -> Result<()> {
        self.mount_fd = Some(mount_fd);
        self.mount_path = PathBuf::from(mount_path);

        let raw = ioctl::get_fs_geometry(mount_fd)?;
        *self.raw_geometry.lock().unwrap() = raw;
        *self.geometry.lock().unwrap() = FsGeometry {
            block_size: raw.blocksize,
            ag_count: raw.agcount,
            ag_blocks: raw.agblocks,
            rt_start: raw.rtstart,
            rg_count: raw.rgcount,
            rg_extents: raw.rgextents,
            rt_ext_size: raw.rtextsize,
        };
        Ok(())
    }

    fn geometry(&self) -> FsGeometry {
        *self.geometry.lock().unwrap()
    }

    fn get_file_extents(&self, path: &str) -> Result<Vec<Extent>> {
        use std::os::unix::fs::MetadataExt;

        let file = self.open_relative(path)?;
        let fd = file.as_raw_fd();
        let ino = file.metadata().map_err(FsError::from)?.ino();

        let fsx = ioctl::get_fsxattr(fd)?;
        if fsx.fsx_nextents == 0 {
            return Ok(Vec::new());
        }

        let map = fetch_bmapx(fd, fsx.fsx_nextents as usize)?;
        let geo = *self.raw_geometry.lock().unwrap();

        let is_rt = fsx.fsx_xflags & FS_XFLAG_REALTIME != 0;
        let (bstart, bbperag) = if is_rt {
            (
                geo.rtstart * (geo.blocksize as u64 / BBSIZE),
                Self::bytes_per_rtgroup(&geo) / BBSIZE,
            )
        } else {
            (0, geo.agblocks as u64 * geo.blocksize as u64 / BBSIZE)
        };
        let ag_rg = if is_rt { "RG" } else { "AG" };

        let entries = &map[1..];
        let mut extents = Vec::new();
        let mut idx = 0u32;
        for entry in entries {
            if entry.bmv_block == -1 || entry.bmv_block == -2 {
                continue;
            }

            let (offset_start, offset_end) = if bbperag > 0 {
                let bno = entry.bmv_block as u64 - bstart;
                let start = bno % bbperag;
                (start, start + entry.bmv_length as u64 - 1)
            } else {
                (0, 0)
            };

            let sector = entry.bmv_block as u64;
            let nr_sectors = entry.bmv_length as u64;
            let info = format!(
                "-- Extent {idx} --\n  File Offset:  [{}..{}]\n  Length:       {}\n  {ag_rg} Range:     [{offset_start}..{offset_end}]\n  Sector Range: [{}..{}]\n",
                entry.bmv_offset,
                entry.bmv_offset + entry.bmv_length - 1,
                nr_sectors,
                sector,
                sector + nr_sectors - 1,
            );

            extents.push(Extent {
                tag: ExtentTag::FileExtent,
                idx,
                ino,
                sector,
                nr_sectors,
                info,
            });
            idx += 1;
        }

        Ok(extents)
    }

    fn get_extents_in_range(&self, start_sector: u64, sector_count: u64) -> Result<Vec<Extent>> {
        let mount_fd = self
            .mount_fd
            .ok_or_else(|| FsError::Invalid("provider not initialized".into()))?;
        let geo = *self.raw_geometry.lock().unwrap();
        let sector_end = start_sector + sector_count;

        let bperag = geo.agblocks as u64 * geo.blocksize as u64;
        let bperrtg = Self::bytes_per_rtgroup(&geo);

        // Only route the query at the realtime device when the range
        // actually starts past the data device's end; a filesystem with
        // no realtime subvolume (`rtstart == 0`) never takes this branch,
        // so plain data-only filesystems are queried against XFS_DEV_DATA
        // same as always.
        let device = if geo.rtstart != 0 && start_sector >= geo.rtstart * (geo.blocksize as u64 / BBSIZE) {
            XFS_DEV_RT
        } else {
            XFS_DEV_DATA
        };
        if device == XFS_DEV_RT && geo.rgcount == 0 {
            return Err(FsError::Unsupported(
                "range starts past the data device but this filesystem has no realtime subvolume".into(),
            ));
        }

        let max_extents = (sector_count * 512 / geo.blocksize as u64) as usize;
        let mut extents = Vec::with_capacity(max_extents.min(4096));

        let mut head = FsMapHead::with_capacity(FSMAP_INITIAL_COUNT);
        head.fmh_keys[0].fmr_physical = start_sector * BBSIZE;
        head.fmh_keys[0].fmr_device = device;
        head.fmh_keys[1].fmr_physical = sector_end * BBSIZE;
        head.fmh_keys[1].fmr_device = device;
        head.fmh_keys[1].fmr_owner = u64::MAX;
        head.fmh_keys[1].fmr_flags = u32::MAX;
        head.fmh_keys[1].fmr_offset = u64::MAX;
        head.fmh_count = 0;

        loop {
            ioctl::get_fsmap(mount_fd, &mut head)?;

            if head.fmh_count == 0 && head.fmh_entries > FSMAP_INITIAL_COUNT {
                head = FsMapHead::with_capacity(head.fmh_entries);
                head.fmh_keys[0].fmr_physical = start_sector * BBSIZE;
                head.fmh_keys[0].fmr_device = device;
                head.fmh_keys[1].fmr_physical = sector_end * BBSIZE;
                head.fmh_keys[1].fmr_device = device;
                head.fmh_keys[1].fmr_owner = u64::MAX;
                head.fmh_keys[1].fmr_flags = u32::MAX;
                head.fmh_keys[1].fmr_offset = u64::MAX;
                continue;
            }
            if head.fmh_count == 0 {
                head.fmh_count = FSMAP_INITIAL_COUNT;
                continue;
            }
            if head.fmh_entries == 0 {
                break;
            }

            for i in 0..head.fmh_entries as usize {
                let rec = head.fmh_recs[i];
                if rec.fmr_flags & FMR_OF_SPECIAL_OWNER != 0 {
                    continue;
                }
                let sector = rec.fmr_physical / BBSIZE;
                if sector < start_sector || sector >= sector_end {
                    continue;
                }

                let (agno_offset, ag_rg) = if rec.fmr_device == XFS_DEV_DATA {
                    (rec.fmr_physical % bperag, "AG")
                } else if rec.fmr_device == XFS_DEV_RT && geo.rgcount > 0 {
                    let start = rec.fmr_physical - geo.rtstart * geo.blocksize as u64;
                    (start % bperrtg, "RG")
                } else {
                    continue;
                };

                if extents.len() >= max_extents {
                    return Err(FsError::Io(
                        "XFS_IOC_FSMAP",
                        std::io::Error::new(
                            std::io::ErrorKind::Other,
                            format!("too many extents in range {start_sector}+{sector_count} (max {max_extents})"),
                        ),
                    ));
                }

                let idx = extents.len() as u32;
                let nr_sectors = rec.fmr_length / BBSIZE;
                let info = format!(
                    "-- Extent {idx} --\n  Inode:        {}\n  File Offset:  [{}..{}]\n  Length:       {}\n  {ag_rg} Range:     [{}..{})\n  Sector Range: [{}..{}]\n",
                    rec.fmr_owner,
                    rec.fmr_offset / BBSIZE,
                    (rec.fmr_offset + rec.fmr_length - 1) / BBSIZE,
                    rec.fmr_length / BBSIZE,
                    agno_offset / BBSIZE,
                    (agno_offset + rec.fmr_length - 1) / BBSIZE,
                    sector,
                    sector + nr_sectors - 1,
                );

                extents.push(Extent {
                    tag: ExtentTag::ZoneExtent,
                    idx,
                    ino: rec.fmr_owner,
                    sector,
                    nr_sectors,
                    info,
                });
            }

            let last = head.fmh_recs[head.fmh_entries as usize - 1];
            if last.fmr_flags & FMR_OF_LAST != 0 {
                break;
            }

            // Advance the query cursor to the last record returned, so the
            // next ioctl call picks up where this page left off instead of
            // returning the same page again.
            head.fmh_keys[0] = last;
        }

        Ok(extents)
    }

    fn get_blockgroups(&self) -> Result<Vec<Blockgroup>> {
        let geo = *self.raw_geometry.lock().unwrap();
        if geo.blocksize == 0 {
            return Err(FsError::Invalid("filesystem geometry not initialized".into()));
        }

        let bbperag = geo.agblocks as u64 * geo.blocksize as u64 / BBSIZE;
        let bbperrg = Self::bytes_per_rtgroup(&geo) / BBSIZE;
        let rtstart = geo.rtstart * geo.blocksize as u64 / BBSIZE;

        let mut bgs = Vec::with_capacity((geo.agcount + geo.rgcount) as usize);
        for ag in 0..geo.agcount {
            bgs.push(Blockgroup::uncorrelated(ag as u64 * bbperag, bbperag));
        }
        for rg in 0..geo.rgcount {
            bgs.push(Blockgroup::uncorrelated(rtstart + rg as u64 * bbperrg, bbperrg));
        }

        Ok(bgs)
    }
}

/// Two-pass extent-map query: the attribute probe already told us the
/// expected count; size the buffer for it, and if the kernel reports the
/// buffer as (possibly) too small, retry once with it doubled.
fn fetch_bmapx(fd: std::os::fd::RawFd, nextents: usize) -> Result<Vec<GetBmapX>> {
    let mut entry_count = nextents * 2 + 1;
    for attempt in 0..BMAP_MAX_ATTEMPTS {
        let map = ioctl::get_bmapx(fd, entry_count)?;
        let bmv_entries = map[0].bmv_entries as i64;
        let bmv_count = map[0].bmv_count as i64;
        if bmv_entries >= bmv_count - 1 {
            if attempt + 1 >= BMAP_MAX_ATTEMPTS {
                return Err(FsError::Io(
                    "XFS_IOC_GETBMAPX",
                    std::io::Error::new(std::io::ErrorKind::Other, "extent map retry exhausted"),
                ));
            }
            entry_count *= 2;
            continue;
        }
        if bmv_entries <= 0 {
            return Ok(Vec::new());
        }
        return Ok(map);
    }
    unreachable!("loop always returns or errors within BMAP_MAX_ATTEMPTS")
}

/// Reads the mount point's `statfs.f_type` so the registry can match it
/// against this provider's magic number.
pub fn probe_magic(mount_path: &Path) -> Result<u32> {
    use std::mem::MaybeUninit;

    let path_c = std::ffi::CString::new(mount_path.as_os_str().as_bytes())
        .map_err(|_| FsError::Invalid("mount path contains a NUL byte".into()))?;
    let mut stf: MaybeUninit<libc::statfs> = MaybeUninit::uninit();
    let ret = unsafe { libc::statfs(path_c.as_ptr(), stf.as_mut_ptr()) };
    if ret < 0 {
        return Err(FsError::Io("statfs", std::io::Error::last_os_error()));
    }
    let stf = unsafe { stf.assume_init() };
    Ok(stf.f_type as u32)
}

/// XFS's statfs magic number (`XFS_SUPER_MAGIC`).
pub const XFS_SUPER_MAGIC: u32 = 0x58465342;
