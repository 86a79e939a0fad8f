//! Resolves a mount directory to the block device backing it.
//!
//! `zonar-core` never does this lookup itself — a session is always
//! opened against an already-resolved device path — so it lives here in
//! the CLI layer instead.

use std::fs;
use std::path::{Path, PathBuf};

/// Finds the device backing `mount_dir` by scanning `/proc/mounts` for the
/// longest mount-point prefix match, the same approach `findmnt`/`mount`
/// use without linking against `libmount`.
pub fn resolve_device(mount_dir: &Path) -> Result<PathBuf, String> {
    let canonical = fs::canonicalize(mount_dir)
        .map_err(|e| format!("{}: {e}", mount_dir.display()))?;

    let mounts = fs::read_to_string("/proc/mounts").map_err(|e| format!("/proc/mounts: {e}"))?;

    let mut best: Option<(PathBuf, PathBuf)> = None;
    for line in mounts.lines() {
        let mut fields = line.split_whitespace();
        let Some(device) = fields.next() else { continue };
        let Some(mount_point) = fields.next() else { continue };
        if !device.starts_with('/') {
            continue;
        }

        let mount_point = PathBuf::from(unescape_mtab(mount_point));
        if !canonical.starts_with(&mount_point) {
            continue;
        }
        let better = match &best {
            Some((_, current)) => mount_point.components().count() > current.components().count(),
            None => true,
        };
        if better {
            best = Some((PathBuf::from(device), mount_point));
        }
    }

    best.map(|(device, _)| device)
        .ok_or_else(|| format!("{}: not found in /proc/mounts", mount_dir.display()))
}

/// `/proc/mounts` escapes space, tab, newline, and backslash as octal
/// `\NNN` sequences.
fn unescape_mtab(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            if let Ok(code) = u8::from_str_radix(std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap_or(""), 8) {
                out.push(code as char);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_octal_space() {
        assert_eq!(unescape_mtab(r"/mnt/my\040share"), "/mnt/my share");
    }

    #[test]
    fn passes_through_plain_paths() {
        assert_eq!(unescape_mtab("/mnt/data"), "/mnt/data");
    }
}
