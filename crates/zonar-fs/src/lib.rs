//! Filesystem provider interface and back-ends.
//!
//! A filesystem back-end is a capability set {init, get-file-extents,
//! get-extents-in-range, get-blockgroups}. The session holds exactly one
//! provider, chosen at mount-open time by the [`registry`].

mod blockgroup;
mod error;
mod extent;
mod provider;
pub mod registry;
mod xfs;

pub use blockgroup::{Blockgroup, BlockgroupType};
pub use error::{FsError, Result};
pub use extent::{Extent, ExtentTag, ANNOTATION_LEN};
pub use provider::{FsGeometry, FsProvider};
pub use xfs::{XfsProvider, XFS_SUPER_MAGIC};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncorrelated_blockgroup_has_no_zones() {
        let bg = Blockgroup::uncorrelated(0, 1024);
        assert!(bg.zones.is_empty());
        assert_eq!(bg.flags, BlockgroupType::Unset);
        assert_eq!(bg.end_sector(), 1024);
    }
}
