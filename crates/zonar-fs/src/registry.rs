//! Maps a filesystem's statfs magic number to a provider constructor.

use crate::error::{FsError, Result};
use crate::provider::FsProvider;
use crate::xfs::{self, XfsProvider};

/// Probes `mount_path`'s filesystem magic number and constructs the
/// matching provider, or fails with [`FsError::Unsupported`] if no
/// provider is registered for it.
pub fn open(mount_path: &std::path::Path) -> Result<Box<dyn FsProvider>> {
    let magic = probe_magic(mount_path)?;
    match magic {
        xfs::XFS_SUPER_MAGIC => Ok(Box::new(XfsProvider::new())),
        other => Err(FsError::Unsupported(format!(
            "no filesystem provider registered for magic {other:#x}"
        ))),
    }
}

/// Reads a mount point's `statfs.f_type`, independently of whichever
/// provider (if any) ends up selected for it. Exposed so callers can
/// report a mount's filesystem type without constructing a provider.
pub fn probe_magic(mount_path: &std::path::Path) -> Result<u32> {
    xfs::probe_magic(mount_path)
}
