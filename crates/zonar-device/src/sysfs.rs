//! Reads per-device attributes from `/sys/block/<name>/...`.

use std::fs;
use std::path::Path;

use crate::error::{DeviceError, Result};

fn attr_path(devname: &str, attr: &str) -> String {
    format!("/sys/block/{devname}/{attr}")
}

fn read_attr(devname: &str, attr: &str) -> Result<String> {
    let path = attr_path(devname, attr);
    let raw = fs::read_to_string(&path).map_err(|_| DeviceError::NotFound(path))?;
    let trimmed = raw.trim_end_matches(['\n', '\r', ' ', '\t']);
    if trimmed.is_empty() {
        return Err(DeviceError::InvalidGeometry(format!(
            "empty sysfs attribute {attr} for {devname}"
        )));
    }
    Ok(trimmed.to_string())
}

fn read_attr_u64(devname: &str, attr: &str) -> Result<u64> {
    let s = read_attr(devname, attr)?;
    s.parse::<u64>()
        .map_err(|_| DeviceError::InvalidGeometry(format!("non-numeric sysfs attribute {attr}")))
}

pub fn is_zoned(devname: &str) -> Result<bool> {
    Ok(read_attr(devname, "queue/zoned")? != "none")
}

pub fn nr_zones(devname: &str) -> Result<u32> {
    Ok(read_attr_u64(devname, "queue/nr_zones")? as u32)
}

pub fn zone_sectors(devname: &str) -> Result<u32> {
    Ok(read_attr_u64(devname, "queue/chunk_sectors")? as u32)
}

/// Returns 0 (meaning "no limit") rather than failing when the attribute
/// is absent, matching the original probe's leniency for these two
/// resource limits.
pub fn max_open_zones(devname: &str) -> u32 {
    read_attr_u64(devname, "queue/max_open_zones").unwrap_or(0) as u32
}

pub fn max_active_zones(devname: &str) -> u32 {
    read_attr_u64(devname, "queue/max_active_zones").unwrap_or(0) as u32
}

/// Builds the vendor/model/revision identification string from the three
/// separate `device/{vendor,model,rev}` sysfs attributes, space-joining
/// whichever are present. Returns `"Unknown"` if none are.
pub fn vendor_id(devname: &str) -> String {
    let parts: Vec<String> = ["device/vendor", "device/model", "device/rev"]
        .iter()
        .filter_map(|attr| read_attr(devname, attr).ok())
        .collect();
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" ")
    }
}

/// Extracts the device's basename the way the original probe does,
/// following symlinks first (required for device-mapper devices).
pub fn canonical_devname(device_path: &Path) -> Result<(std::path::PathBuf, String)> {
    let real = fs::canonicalize(device_path)?;
    let name = real
        .file_name()
        .ok_or_else(|| DeviceError::InvalidGeometry(format!("{} has no basename", real.display())))?
        .to_string_lossy()
        .into_owned();
    Ok((real, name))
}
