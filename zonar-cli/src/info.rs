//! Human-readable session summary, printed by `zonar`'s default action
//! once a session is open.

use zonar_core::Session;

/// Prints mount directory, device identification, capacity, and zone
/// geometry for `session` to standard output.
pub fn print(session: &Session) {
    println!("mount:      {}", session.mount_path);
    println!("filesystem: magic {:#010x}", session.fs_magic);

    let Some(device) = session.descriptor.as_ref() else {
        println!("device:     (none)");
        return;
    };

    println!("device:     {}", device.path);
    println!("vendor:     {}", device.vendor_id);
    println!(
        "capacity:   {} sectors ({} logical blocks of {} bytes, {} physical blocks of {} bytes)",
        device.nr_sectors, device.nr_lblocks, device.lblock_size, device.nr_pblocks, device.pblock_size
    );

    if device.is_zoned {
        println!(
            "zones:      {} zones of {} sectors ({} bytes), max-open={} max-active={}",
            device.nr_zones, device.zone_sectors, device.zone_size, device.max_nr_open_zones, device.max_nr_active_zones
        );
        println!("conventional zones (leading): {}", session.leading_conventional_zones);
        for (i, zone) in session.zones.iter().enumerate() {
            println!("  {}", zone.info_line(i as u64));
        }
    } else {
        println!("zones:      (not a zoned device)");
    }

    println!("blockgroups: {}", session.blockgroups.len());
}
