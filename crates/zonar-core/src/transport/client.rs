//! Client-side request functions: one blocking call per wire operation,
//! one function per request kind.

use std::io::Cursor;
use std::net::{SocketAddr, TcpStream};

use binrw::prelude::*;

use zonar_device::{DeviceDescriptor, Zone};
use zonar_fs::{Blockgroup, Extent};
use zonar_wire::{BlockgroupRecord, DevInfoReply, ExtentRecord, MntdirInfoReply, RequestHeader, RequestId, ZoneRecord};

use crate::convert;
use crate::error::{CoreError, Result};

use super::{recv_reply, send_request};

fn check_err(rep_err: u32) -> Result<()> {
    if rep_err != 0 {
        return Err(CoreError::from_errno(rep_err));
    }
    Ok(())
}

pub fn connect(addr: SocketAddr) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(true)?;
    super::tune_socket_buffers(&stream);
    Ok(stream)
}

/// Reverse mode: waits for a `zonar-srv` to connect in on `port`, instead
/// of connecting out to one.
pub fn listen_for_server(port: u16) -> Result<TcpStream> {
    let listener = std::net::TcpListener::bind(("0.0.0.0", port))?;
    let (stream, peer) = listener.accept()?;
    log::info!("server connected from {peer}");
    stream.set_nodelay(true)?;
    super::tune_socket_buffers(&stream);
    Ok(stream)
}

pub fn mntdir_info(stream: &mut TcpStream) -> Result<(u32, String)> {
    let req = RequestHeader::new(RequestId::MntdirInfo);
    send_request(stream, &req)?;
    let (rep, payload) = recv_reply(stream)?;
    check_err(rep.err)?;

    let reply = MntdirInfoReply::read(&mut Cursor::new(&payload)).map_err(zonar_wire::WireError::from)?;
    Ok((reply.fs_type, reply.mount_path.as_str().to_string()))
}

pub fn dev_info(stream: &mut TcpStream) -> Result<DeviceDescriptor> {
    let req = RequestHeader::new(RequestId::DevInfo);
    send_request(stream, &req)?;
    let (rep, payload) = recv_reply(stream)?;
    check_err(rep.err)?;

    let reply = DevInfoReply::read(&mut Cursor::new(&payload)).map_err(zonar_wire::WireError::from)?;
    Ok(convert::device_from_wire(&reply))
}

/// Fetches `count` zones starting at `zone_number`.
///
/// The reply is decoded into a fresh `Vec` before anything touches the
/// caller's own zone array, so a short or malformed reply never leaves
/// a partially-overwritten session state behind.
pub fn dev_rep_zones(stream: &mut TcpStream, zone_number: u32, count: u32) -> Result<Vec<Zone>> {
    let req = RequestHeader::new(RequestId::DevRepZones).with_zones(zone_number, count);
    send_request(stream, &req)?;
    let (rep, payload) = recv_reply(stream)?;
    check_err(rep.err)?;

    decode_packed(&payload, ZoneRecord::WIRE_SIZE, |buf| {
        ZoneRecord::read(&mut Cursor::new(buf))
            .map(|r| convert::zone_from_wire(&r))
            .map_err(zonar_wire::WireError::from)
    })
}

pub fn file_extents(stream: &mut TcpStream, path: &str) -> Result<Vec<Extent>> {
    let req = RequestHeader::new(RequestId::FileExtents).with_path(path);
    send_request(stream, &req)?;
    let (rep, payload) = recv_reply(stream)?;
    check_err(rep.err)?;

    decode_packed(&payload, ExtentRecord::WIRE_SIZE, |buf| {
        ExtentRecord::read(&mut Cursor::new(buf))
            .map(|r| convert::extent_from_wire(&r))
            .map_err(zonar_wire::WireError::from)
    })
}

pub fn extents_in_range(stream: &mut TcpStream, sector: u64, sector_count: u64) -> Result<Vec<Extent>> {
    let req = RequestHeader::new(RequestId::ExtentsInRange).with_range(sector, sector_count);
    send_request(stream, &req)?;
    let (rep, payload) = recv_reply(stream)?;
    check_err(rep.err)?;

    decode_packed(&payload, ExtentRecord::WIRE_SIZE, |buf| {
        ExtentRecord::read(&mut Cursor::new(buf))
            .map(|r| convert::extent_from_wire(&r))
            .map_err(zonar_wire::WireError::from)
    })
}

/// Fetches every blockgroup. The server answers with two replies: the
/// first carries only the count, the second the packed record array.
pub fn blockgroups(stream: &mut TcpStream) -> Result<Vec<Blockgroup>> {
    let req = RequestHeader::new(RequestId::Blockgroups);
    send_request(stream, &req)?;

    let (count_rep, count_payload) = recv_reply(stream)?;
    check_err(count_rep.err)?;
    if count_payload.len() < 4 {
        return Err(CoreError::Invalid("truncated blockgroup count reply".into()));
    }
    let count = u32::from_be_bytes(count_payload[0..4].try_into().unwrap());

    let (rep, payload) = recv_reply(stream)?;
    check_err(rep.err)?;

    let expected = count as usize * BlockgroupRecord::WIRE_SIZE;
    if payload.len() != expected {
        return Err(CoreError::Invalid(format!(
            "blockgroup reply payload is {} bytes, expected {expected} for {count} records",
            payload.len()
        )));
    }

    let mut out = Vec::with_capacity(count as usize);
    for chunk in payload.chunks_exact(BlockgroupRecord::WIRE_SIZE) {
        let rec = BlockgroupRecord::read(&mut Cursor::new(chunk)).map_err(zonar_wire::WireError::from)?;
        out.push(convert::blockgroup_from_wire(&rec));
    }
    Ok(out)
}

/// Decodes a reply payload that is simply a packed array of fixed-size
/// records, with no count prefix: the record count is implied by
/// `payload.len() / record_size`.
fn decode_packed<T>(
    payload: &[u8],
    record_size: usize,
    mut decode_one: impl FnMut(&[u8]) -> std::result::Result<T, zonar_wire::WireError>,
) -> Result<Vec<T>> {
    if payload.len() % record_size != 0 {
        return Err(CoreError::Wire(zonar_wire::WireError::UnalignedPayload {
            size: payload.len(),
            record_size,
        }));
    }

    let mut out = Vec::with_capacity(payload.len() / record_size);
    for chunk in payload.chunks_exact(record_size) {
        out.push(decode_one(chunk)?);
    }
    Ok(out)
}
