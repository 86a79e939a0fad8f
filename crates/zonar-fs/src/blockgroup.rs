//! A single blockgroup (allocation group or realtime group) as returned by
//! a filesystem provider, before correlation with device zones. Overlapping
//! zones are tracked as an index list into the session's zone array rather
//! than owned pointers, since the zone array can be replaced wholesale on
//! refresh.

/// Zone type inherited from the blockgroup's first overlapping zone, once
/// correlated. `Unset` is the provider's zero-initialized value before
/// the correlator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockgroupType {
    #[default]
    Unset,
    Conventional,
    SeqWriteRequired,
    SeqWritePreferred,
}

/// A contiguous sector range of the filesystem's allocation topology.
///
/// `zones` is an index list into the session's zone array, not raw
/// pointers — it keeps the blockgroup array and zone array independently
/// owned with no cyclic references, and makes the wire representation of
/// the (otherwise redundant) zone-pointer array trivial to recompute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blockgroup {
    pub sector: u64,
    pub nr_sectors: u64,
    pub wp_sector: u64,
    pub flags: BlockgroupType,
    pub zones: Vec<usize>,
}

impl Blockgroup {
    pub fn end_sector(&self) -> u64 {
        self.sector + self.nr_sectors
    }

    /// A blockgroup as returned directly from a provider, before
    /// correlation: geometry only, zero write pointer, no zones.
    pub fn uncorrelated(sector: u64, nr_sectors: u64) -> Self {
        Self {
            sector,
            nr_sectors,
            wp_sector: 0,
            flags: BlockgroupType::Unset,
            zones: Vec::new(),
        }
    }
}
