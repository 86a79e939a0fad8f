//! Zoned block device probing: sysfs geometry attributes, block ioctls,
//! and zone reports.

mod error;
mod ioctl;
mod probe;
mod sysfs;
mod types;

pub use error::{DeviceError, Result};
pub use probe::{Device, REPORT_MAX_ZONES};
pub use types::{DeviceDescriptor, Zone, ZoneCondition, ZoneType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_end_is_start_plus_len() {
        let z = Zone {
            start: 1000,
            len: 500,
            wp: 1100,
            capacity: 500,
            ty: ZoneType::SeqWriteRequired,
            cond: ZoneCondition::ImplicitOpen,
        };
        assert_eq!(z.end(), 1500);
        assert!(!z.is_conventional());
    }

    #[test]
    fn conventional_zone_info_line_omits_wp() {
        let z = Zone {
            start: 0,
            len: 2048,
            wp: 0,
            capacity: 2048,
            ty: ZoneType::Conventional,
            cond: ZoneCondition::NotWp,
        };
        let line = z.info_line(0);
        assert!(!line.contains("wp="));
    }
}
