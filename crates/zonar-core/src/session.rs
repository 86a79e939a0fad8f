//! Session state: the handles and arrays a running inspection holds for
//! its lifetime, whether serving local requests directly or acting as a
//! client of a remote `zonar-srv`.
//!
//! Modeled as one owned value threaded by `&mut self` through every
//! operation, rather than split across free functions passing handles
//! around individually.

use std::fs::File;
use std::net::{SocketAddr, TcpStream};

use zonar_device::{Device, DeviceDescriptor, Zone};
use zonar_fs::{Blockgroup, Extent, FsProvider};

use crate::error::{CoreError, Result};
use crate::transport;

/// How a session reaches its device and filesystem data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Device and filesystem are probed directly in this process.
    Local,
    /// Requests are forwarded to a `zonar-srv` at this address.
    Client(SocketAddr),
    /// This process answers requests from clients as they connect.
    Server(SocketAddr),
}

impl Mode {
    pub fn is_local(&self) -> bool {
        matches!(self, Mode::Local)
    }

    pub fn is_remote_client(&self) -> bool {
        matches!(self, Mode::Client(_))
    }
}

/// The full state of one inspection run.
///
/// A local session owns its [`Device`] and [`FsProvider`] directly; a
/// client session's `device`/`provider` are `None` and its `descriptor`
/// and standing `zones`/`blockgroups` arrays come from the server's
/// replies instead. Every "remote adapter" method below checks `mode`
/// and routes to the matching component directly, or to the matching
/// wire call over `client_stream`.
pub struct Session {
    pub mode: Mode,
    pub mount_path: String,
    /// The mount point's filesystem magic number (`statfs.f_type`), sent
    /// back verbatim in a `MNTDIR_INFO` reply.
    pub fs_magic: u32,
    pub device: Option<Device>,
    /// The device descriptor, available in both local and client mode
    /// (a client session never opens a local device, so this is the only
    /// place it keeps the geometry it fetched over the wire at open time).
    pub descriptor: Option<DeviceDescriptor>,
    pub provider: Option<Box<dyn FsProvider>>,
    /// The zone array and blockgroup array as of the last local open or
    /// explicit `refresh`. Kept for callers (e.g. a GUI, or `zonar`'s
    /// `info` output) that want a standing, consistent view without
    /// issuing a fresh query; the remote-adapter methods below never
    /// read or write these on a per-query basis. A caller that wants a
    /// consistent view after the underlying device or filesystem may
    /// have changed must call `refresh` before querying.
    pub zones: Vec<Zone>,
    pub blockgroups: Vec<Blockgroup>,
    /// Number of conventional zones at the front of `zones`, counted once
    /// at open time.
    pub leading_conventional_zones: u32,
    /// Keeps the mount directory's file descriptor alive for the
    /// lifetime of the session; the filesystem provider borrows its raw
    /// fd but does not own it.
    mount_dir: Option<File>,
    /// The single open connection a client-mode session keeps to its
    /// server for the lifetime of the session — one connection per
    /// session, reused for every request.
    client_stream: Option<TcpStream>,
}

impl Session {
    pub fn empty(mode: Mode, mount_path: impl Into<String>) -> Self {
        Self {
            mode,
            mount_path: mount_path.into(),
            fs_magic: 0,
            device: None,
            descriptor: None,
            provider: None,
            zones: Vec::new(),
            blockgroups: Vec::new(),
            leading_conventional_zones: 0,
            mount_dir: None,
            client_stream: None,
        }
    }

    pub fn set_mount_dir(&mut self, mount_dir: File) {
        self.mount_dir = Some(mount_dir);
    }

    pub fn set_client_stream(&mut self, stream: TcpStream) {
        self.client_stream = Some(stream);
    }

    pub fn is_zoned(&self) -> bool {
        self.descriptor.as_ref().map(|d| d.is_zoned).unwrap_or(false)
    }

    fn client_stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.client_stream
            .as_mut()
            .ok_or_else(|| CoreError::Invalid("client session has no open connection".into()))
    }

    /// Component A, transparently: a fresh device descriptor, either read
    /// directly or fetched over the wire.
    pub fn device_info(&mut self) -> Result<DeviceDescriptor> {
        match self.mode {
            Mode::Client(_) => {
                let stream = self.client_stream_mut()?;
                transport::client::dev_info(stream)
            }
            _ => self
                .descriptor
                .clone()
                .ok_or_else(|| CoreError::Invalid("session has no device".into())),
        }
    }

    /// Component A, transparently: `count` zones starting at
    /// `zone_number`, read live from the device (never from the session's
    /// standing `zones` cache — results are never cached across requests).
    pub fn report_zones(&mut self, zone_number: u32, count: u32) -> Result<Vec<Zone>> {
        match self.mode {
            Mode::Client(_) => {
                let stream = self.client_stream_mut()?;
                transport::client::dev_rep_zones(stream, zone_number, count)
            }
            _ => {
                let device = self
                    .device
                    .as_ref()
                    .ok_or_else(|| CoreError::Invalid("session has no local device".into()))?;
                Ok(device.report_zones(zone_number, count)?)
            }
        }
    }

    /// Component B, transparently: a file's extent map.
    pub fn file_extents(&mut self, path: &str) -> Result<Vec<Extent>> {
        match self.mode {
            Mode::Client(_) => {
                let stream = self.client_stream_mut()?;
                transport::client::file_extents(stream, path)
            }
            _ => {
                let provider = self
                    .provider
                    .as_ref()
                    .ok_or_else(|| CoreError::Invalid("session has no filesystem provider".into()))?;
                Ok(provider.get_file_extents(path)?)
            }
        }
    }

    /// Component B, transparently: the reverse sector-range map.
    pub fn extents_in_range(&mut self, sector: u64, sector_count: u64) -> Result<Vec<Extent>> {
        match self.mode {
            Mode::Client(_) => {
                let stream = self.client_stream_mut()?;
                transport::client::extents_in_range(stream, sector, sector_count)
            }
            _ => {
                let provider = self
                    .provider
                    .as_ref()
                    .ok_or_else(|| CoreError::Invalid("session has no filesystem provider".into()))?;
                Ok(provider.get_extents_in_range(sector, sector_count)?)
            }
        }
    }

    /// Component B, transparently: the filesystem's blockgroups as
    /// reported fresh by the provider, uncorrelated (`wp_sector`/`flags`/
    /// `zones` all zero). Callers that want the correlated view should
    /// use `self.blockgroups` (refreshed via [`crate::refresh_blockgroups`])
    /// instead.
    pub fn blockgroups_live(&mut self) -> Result<Vec<Blockgroup>> {
        match self.mode {
            Mode::Client(_) => {
                let stream = self.client_stream_mut()?;
                transport::client::blockgroups(stream)
            }
            _ => {
                let provider = self
                    .provider
                    .as_ref()
                    .ok_or_else(|| CoreError::Invalid("session has no filesystem provider".into()))?;
                Ok(provider.get_blockgroups()?)
            }
        }
    }

    /// Re-reads only the zone span the standing blockgroup array actually
    /// covers, then recorrelates `self.blockgroups` against the updated
    /// `self.zones` in place. Returns the blockgroup count.
    ///
    /// This is the only operation that re-reads device/filesystem state on
    /// an already-open session; every other query answers from whatever
    /// the last open or refresh left behind, or (in client mode) a fresh
    /// wire round trip.
    pub fn refresh(&mut self) -> Result<u32> {
        let descriptor = self
            .descriptor
            .clone()
            .ok_or_else(|| CoreError::Invalid("session has no device".into()))?;

        if descriptor.is_zoned && !self.blockgroups.is_empty() {
            let (z0, z1) = crate::correlator::zone_span(
                &self.blockgroups,
                descriptor.zone_sectors,
                descriptor.nr_zones,
            )?;
            let refreshed = self.report_zones(z0, z1 - z0)?;
            if refreshed.len() != (z1 - z0) as usize || self.zones.len() < z1 as usize {
                return Err(CoreError::Invalid(
                    "report_zones returned fewer zones than the blockgroup array's span needs".into(),
                ));
            }
            self.zones[z0 as usize..z1 as usize].copy_from_slice(&refreshed);
        }

        crate::correlator::refresh(&descriptor, &self.zones, &mut self.blockgroups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_local_session_is_not_zoned() {
        let session = Session::empty(Mode::Local, "/mnt/data");
        assert!(!session.is_zoned());
    }

    #[test]
    fn client_session_without_connection_reports_invalid() {
        let addr: SocketAddr = "127.0.0.1:49152".parse().unwrap();
        let mut session = Session::empty(Mode::Client(addr), "");
        let err = session.device_info().unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
    }

    #[test]
    fn mode_predicates() {
        let addr: SocketAddr = "127.0.0.1:49152".parse().unwrap();
        assert!(Mode::Local.is_local());
        assert!(!Mode::Local.is_remote_client());
        assert!(Mode::Client(addr).is_remote_client());
        assert!(!Mode::Server(addr).is_local());
    }
}
