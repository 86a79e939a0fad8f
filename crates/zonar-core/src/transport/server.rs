//! Server-side dispatch loop: accepts connections and answers requests
//! against a local [`Session`] until told to stop.
//!
//! The accept loop polls an abort flag set by the process's signal
//! handler rather than blocking uninterruptibly in `accept()`.

use std::io::Cursor;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use binrw::prelude::*;
use log::{info, warn};

use zonar_wire::{BlockgroupRecord, ExtentRecord, MntdirInfoReply, ReplyHeader, RequestHeader, RequestId};

use crate::convert;
use crate::error::{CoreError, Result};
use crate::session::Session;

use super::{recv_request, send_reply};

/// Accepts connections on `addr` and serves them one at a time against
/// `session`, until `abort` is set.
pub fn run(session: &Session, addr: SocketAddr, abort: &AtomicBool) -> Result<()> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    info!("zonar-srv listening on {addr}");

    while !abort.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!("accepted connection from {peer}");
                stream.set_nonblocking(false)?;
                super::tune_socket_buffers(&stream);
                if let Err(e) = serve_connection(session, stream, abort) {
                    warn!("connection from {peer} ended: {e}");
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(200));
            }
            Err(e) => return Err(CoreError::Io(e)),
        }
    }
    Ok(())
}

/// Reverse mode: actively connects out to a client waiting at `addr`
/// instead of listening for one, then serves that single connection the
/// same way `run` would.
pub fn run_reverse(session: &Session, addr: SocketAddr, abort: &AtomicBool) -> Result<()> {
    info!("connecting to waiting client at {addr}");
    let stream = TcpStream::connect(addr)?;
    super::tune_socket_buffers(&stream);
    serve_connection(session, stream, abort)
}

fn serve_connection(session: &Session, mut stream: TcpStream, abort: &AtomicBool) -> Result<()> {
    loop {
        if abort.load(Ordering::Relaxed) {
            return Ok(());
        }
        let req = match recv_request(&mut stream) {
            Ok(r) => r,
            Err(CoreError::ConnectionReset) => return Ok(()),
            Err(e) => return Err(e),
        };
        dispatch(session, &mut stream, &req)?;
    }
}

fn dispatch(session: &Session, stream: &mut TcpStream, req: &RequestHeader) -> Result<()> {
    let id = match req.request_id() {
        Ok(id) => id,
        Err(_) => {
            let rep = ReplyHeader::error(RequestId::MntdirInfo, libc::EPROTO as u32);
            return send_reply(stream, &rep, &[]);
        }
    };

    match id {
        RequestId::MntdirInfo => handle_mntdir_info(session, stream),
        RequestId::DevInfo => handle_dev_info(session, stream),
        RequestId::DevRepZones => handle_dev_rep_zones(session, stream, req),
        RequestId::FileExtents => handle_file_extents(session, stream, req),
        RequestId::ExtentsInRange => handle_extents_in_range(session, stream, req),
        RequestId::Blockgroups => handle_blockgroups(session, stream),
    }
}

fn encode<T>(value: &T) -> Result<Vec<u8>>
where
    T: for<'a> BinWrite<Args<'a> = ()>,
{
    let mut buf = Vec::new();
    value.write(&mut Cursor::new(&mut buf)).map_err(zonar_wire::WireError::from)?;
    Ok(buf)
}

fn handle_mntdir_info(session: &Session, stream: &mut TcpStream) -> Result<()> {
    let reply = MntdirInfoReply {
        fs_type: session.fs_magic,
        mount_path: zonar_wire::FixedStr::new(session.mount_path.clone()),
    };
    let buf = encode(&reply)?;
    let rep = ReplyHeader::ok(RequestId::MntdirInfo, buf.len() as u32);
    send_reply(stream, &rep, &buf)
}

fn handle_dev_info(session: &Session, stream: &mut TcpStream) -> Result<()> {
    let Some(device) = session.device.as_ref() else {
        let rep = ReplyHeader::error(RequestId::DevInfo, libc::ENODEV as u32);
        return send_reply(stream, &rep, &[]);
    };
    let reply = convert::device_to_wire(&device.descriptor);
    let buf = encode(&reply)?;
    let rep = ReplyHeader::ok(RequestId::DevInfo, buf.len() as u32);
    send_reply(stream, &rep, &buf)
}

/// Validates the requested range against the device's zone count, then
/// calls the device probe directly for a live report — never the
/// session's standing `zones` cache, which may be stale.
///
/// The report is marshaled into a fresh buffer before anything is sent;
/// the session's own zone array, if any, is never mutated to do this.
fn handle_dev_rep_zones(session: &Session, stream: &mut TcpStream, req: &RequestHeader) -> Result<()> {
    let Some(device) = session.device.as_ref() else {
        let rep = ReplyHeader::error(RequestId::DevRepZones, libc::ENODEV as u32);
        return send_reply(stream, &rep, &[]);
    };

    let start = req.zone_number;
    let count = req.zone_count;
    if count == 0 || start.checked_add(count).map(|e| e > device.descriptor.nr_zones).unwrap_or(true) {
        let rep = ReplyHeader::error(RequestId::DevRepZones, libc::EINVAL as u32);
        return send_reply(stream, &rep, &[]);
    }

    let zones = match device.report_zones(start, count) {
        Ok(z) => z,
        Err(err) => {
            let rep = ReplyHeader::error(RequestId::DevRepZones, CoreError::from(err).errno_like());
            return send_reply(stream, &rep, &[]);
        }
    };

    let mut buf = Vec::with_capacity(zones.len() * zonar_wire::ZoneRecord::WIRE_SIZE);
    for zone in &zones {
        buf.extend_from_slice(&encode(&convert::zone_to_wire(zone))?);
    }
    let rep = ReplyHeader::ok(RequestId::DevRepZones, buf.len() as u32);
    send_reply(stream, &rep, &buf)
}

fn handle_file_extents(session: &Session, stream: &mut TcpStream, req: &RequestHeader) -> Result<()> {
    let Some(provider) = session.provider.as_ref() else {
        let rep = ReplyHeader::error(RequestId::FileExtents, libc::ENODEV as u32);
        return send_reply(stream, &rep, &[]);
    };

    let extents = match provider.get_file_extents(req.path.as_str()) {
        Ok(e) => e,
        Err(err) => {
            let rep = ReplyHeader::error(RequestId::FileExtents, CoreError::from(err).errno_like());
            return send_reply(stream, &rep, &[]);
        }
    };

    let mut buf = Vec::with_capacity(extents.len() * ExtentRecord::WIRE_SIZE);
    for extent in &extents {
        buf.extend_from_slice(&encode(&convert::extent_to_wire(extent))?);
    }
    let rep = ReplyHeader::ok(RequestId::FileExtents, buf.len() as u32);
    send_reply(stream, &rep, &buf)
}

fn handle_extents_in_range(session: &Session, stream: &mut TcpStream, req: &RequestHeader) -> Result<()> {
    let Some(provider) = session.provider.as_ref() else {
        let rep = ReplyHeader::error(RequestId::ExtentsInRange, libc::ENODEV as u32);
        return send_reply(stream, &rep, &[]);
    };

    let extents = match provider.get_extents_in_range(req.sector, req.sector_count) {
        Ok(e) => e,
        Err(err) => {
            let rep = ReplyHeader::error(RequestId::ExtentsInRange, CoreError::from(err).errno_like());
            return send_reply(stream, &rep, &[]);
        }
    };

    let mut buf = Vec::with_capacity(extents.len() * ExtentRecord::WIRE_SIZE);
    for extent in &extents {
        buf.extend_from_slice(&encode(&convert::extent_to_wire(extent))?);
    }
    let rep = ReplyHeader::ok(RequestId::ExtentsInRange, buf.len() as u32);
    send_reply(stream, &rep, &buf)
}

/// Answers `BLOCKGROUPS` with two replies: a count, then the packed
/// record array. Calls the filesystem provider directly for a fresh
/// enumeration rather than the session's standing, already-correlated
/// `blockgroups` — the wire op hands back raw geometry the same way a
/// local query would, and leaves correlating it against a zone report
/// up to the receiver. Results are never cached across requests.
fn handle_blockgroups(session: &Session, stream: &mut TcpStream) -> Result<()> {
    let Some(provider) = session.provider.as_ref() else {
        let rep = ReplyHeader::error(RequestId::Blockgroups, libc::ENODEV as u32);
        return send_reply(stream, &rep, &[]);
    };

    let blockgroups = match provider.get_blockgroups() {
        Ok(bgs) => bgs,
        Err(err) => {
            let rep = ReplyHeader::error(RequestId::Blockgroups, CoreError::from(err).errno_like());
            return send_reply(stream, &rep, &[]);
        }
    };

    let count = blockgroups.len() as u32;
    let count_rep = ReplyHeader::ok(RequestId::Blockgroups, 4);
    send_reply(stream, &count_rep, &count.to_be_bytes())?;

    let mut buf = Vec::with_capacity(blockgroups.len() * BlockgroupRecord::WIRE_SIZE);
    for bg in &blockgroups {
        buf.extend_from_slice(&encode(&convert::blockgroup_to_wire(bg))?);
    }
    let rep = ReplyHeader::ok(RequestId::Blockgroups, buf.len() as u32);
    send_reply(stream, &rep, &buf)
}
