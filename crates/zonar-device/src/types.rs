//! Domain types describing a device and its zones.
//!
//! These mirror the wire-level enums in `zonar-wire` but are the types the
//! rest of the crate (and `zonar-core`) actually works with; the `From`/
//! `TryFrom` impls at the edge translate between the two.

use std::fmt;

/// Identifies one zoned or conventional block device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub path: String,
    pub vendor_id: String,
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
    pub is_zoned: bool,
}

/// A zone's write-pointer discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneType {
    Conventional,
    SeqWriteRequired,
    SeqWritePreferred,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneType::Conventional => "conventional",
            ZoneType::SeqWriteRequired => "seq-write-required",
            ZoneType::SeqWritePreferred => "seq-write-preferred",
        };
        f.write_str(s)
    }
}

impl ZoneType {
    /// Three-letter short form, for compact zone listings.
    pub fn short_code(&self) -> &'static str {
        match self {
            ZoneType::Conventional => "cnv",
            ZoneType::SeqWriteRequired => "swr",
            ZoneType::SeqWritePreferred => "swp",
        }
    }
}

/// A zone's current condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneCondition {
    NotWp,
    Empty,
    Full,
    ImplicitOpen,
    ExplicitOpen,
    Closed,
    ReadOnly,
    Offline,
    Active,
}

impl fmt::Display for ZoneCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneCondition::NotWp => "not-write-pointer",
            ZoneCondition::Empty => "empty",
            ZoneCondition::Full => "full",
            ZoneCondition::ImplicitOpen => "open-implicit",
            ZoneCondition::ExplicitOpen => "open-explicit",
            ZoneCondition::Closed => "closed",
            ZoneCondition::ReadOnly => "read-only",
            ZoneCondition::Offline => "offline",
            ZoneCondition::Active => "active",
        };
        f.write_str(s)
    }
}

impl ZoneCondition {
    /// Two-letter short form, for compact zone listings.
    pub fn short_code(&self) -> &'static str {
        match self {
            ZoneCondition::NotWp => "nw",
            ZoneCondition::Empty => "em",
            ZoneCondition::Full => "fu",
            ZoneCondition::ImplicitOpen => "oi",
            ZoneCondition::ExplicitOpen => "oe",
            ZoneCondition::Closed => "cl",
            ZoneCondition::ReadOnly => "ro",
            ZoneCondition::Offline => "ol",
            ZoneCondition::Active => "ac",
        }
    }
}

/// One zone as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub start: u64,
    pub len: u64,
    pub wp: u64,
    pub capacity: u64,
    pub ty: ZoneType,
    pub cond: ZoneCondition,
}

impl Zone {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    pub fn is_conventional(&self) -> bool {
        matches!(self.ty, ZoneType::Conventional)
    }

    /// A single-line summary in the style of the original tool's
    /// zone-info panel, minus its markup.
    pub fn info_line(&self, zone_no: u64) -> String {
        if self.is_conventional() {
            format!(
                "zone {zone_no}: type={} start={} len={} capacity={} cond={}",
                self.ty, self.start, self.len, self.capacity, self.cond
            )
        } else {
            format!(
                "zone {zone_no}: type={} start={} len={} capacity={} wp=+{} cond={}",
                self.ty,
                self.start,
                self.len,
                self.capacity,
                self.wp.saturating_sub(self.start),
                self.cond
            )
        }
    }
}
