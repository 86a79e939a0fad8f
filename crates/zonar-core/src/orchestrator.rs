//! Assembles a [`Session`] by driving the device probe, filesystem
//! provider, and correlator in the right order, and tears it down again.

use std::fs::File;
use std::net::{SocketAddr, TcpStream};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use log::info;

use zonar_device::Device;

use crate::correlator;
use crate::error::Result;
use crate::session::{Mode, Session};
use crate::transport;

/// Opens a session against a device and filesystem directly in this
/// process.
///
/// Sequence: resolve the filesystem provider for `mount_path`, open the
/// mount directory and hand its fd to the provider, open the device and
/// read its full zone report, count the leading conventional zones, then
/// correlate zones against blockgroups.
pub fn open_local(mount_path: impl AsRef<Path>, device_path: impl AsRef<Path>) -> Result<Session> {
    let mount_path = mount_path.as_ref();

    let mut provider = zonar_fs::registry::open(mount_path)?;

    let mount_dir = File::open(mount_path)?;
    let mount_fd = mount_dir.as_raw_fd();
    provider.init(mount_fd, &mount_path.display().to_string())?;

    let device = Device::open(device_path.as_ref())?;

    let mut blockgroups = provider.get_blockgroups()?;

    let zones = if device.descriptor.is_zoned {
        device.report_zones(0, device.descriptor.nr_zones)?
    } else {
        Vec::new()
    };

    let leading_conventional_zones = zones
        .iter()
        .take_while(|z| z.is_conventional())
        .count() as u32;

    correlator::refresh(&device.descriptor, &zones, &mut blockgroups)?;

    info!(
        "opened local session: mount={} device={} zones={} blockgroups={}",
        mount_path.display(),
        device.descriptor.path,
        zones.len(),
        blockgroups.len()
    );

    let mut session = Session::empty(Mode::Local, mount_path.display().to_string());
    session.fs_magic = zonar_fs::registry::probe_magic(mount_path)?;
    session.descriptor = Some(device.descriptor.clone());
    session.device = Some(device);
    session.provider = Some(provider);
    session.zones = zones;
    session.blockgroups = blockgroups;
    session.leading_conventional_zones = leading_conventional_zones;
    session.set_mount_dir(mount_dir);

    Ok(session)
}

/// Opens a session that forwards every request to a `zonar-srv` at
/// `addr`.
///
/// Sequence: connect, then issue `MNTDIR_INFO`, `DEV_INFO`,
/// `DEV_REP_ZONES(0, all)`, and `BLOCKGROUPS` in that order to populate
/// the session from the replies. The connection is kept open for the
/// session's lifetime; every later query reuses it.
///
/// The blockgroup array the server sends back is uncorrelated (its
/// `zones` index list is always opaque on the wire, per
/// `zonar_wire::BlockgroupRecord`), so this runs the correlator locally
/// against the zone report this same open sequence just fetched —
/// exactly as a local open would, just sourced over the wire.
pub fn open_client(addr: SocketAddr) -> Result<Session> {
    let stream = transport::client::connect(addr)?;
    open_client_over(stream)
}

/// Same as [`open_client`], but for a connection already established by
/// the caller — used in reverse mode, where the client waits for
/// `zonar-srv` to connect in (via [`transport::client::listen_for_server`])
/// instead of dialing out.
pub fn open_client_over(mut stream: TcpStream) -> Result<Session> {
    let addr = stream.peer_addr()?;

    let (fs_magic, mount_path) = transport::client::mntdir_info(&mut stream)?;
    let descriptor = transport::client::dev_info(&mut stream)?;

    let zones = if descriptor.is_zoned {
        transport::client::dev_rep_zones(&mut stream, 0, descriptor.nr_zones)?
    } else {
        Vec::new()
    };

    let leading_conventional_zones = zones
        .iter()
        .take_while(|z| z.is_conventional())
        .count() as u32;

    let mut blockgroups = transport::client::blockgroups(&mut stream)?;
    correlator::refresh(&descriptor, &zones, &mut blockgroups)?;

    info!(
        "opened client session: server={addr} mount={mount_path} zones={} blockgroups={}",
        zones.len(),
        blockgroups.len()
    );

    let mut session = Session::empty(Mode::Client(addr), mount_path);
    session.fs_magic = fs_magic;
    session.descriptor = Some(descriptor);
    session.zones = zones;
    session.blockgroups = blockgroups;
    session.leading_conventional_zones = leading_conventional_zones;
    session.set_client_stream(stream);

    Ok(session)
}
