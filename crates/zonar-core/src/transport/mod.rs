//! Blocking TCP transport for the zonar wire protocol.
//!
//! A connection carries one request/reply pair at a time; the server
//! loop in [`server`] answers requests sequentially on each connection,
//! and the client calls in [`client`] block until their reply arrives.
//! Short reads and writes are retried until the full length transfers;
//! a zero-length read or write means the peer hung up and is reported
//! as a reset connection, not silently swallowed.

pub mod client;
pub mod server;

use std::io::{Cursor, Read, Write};
use std::net::TcpStream;
use std::os::fd::AsFd;

use binrw::prelude::*;
use nix::sys::socket::{setsockopt, sockopt};

use zonar_wire::{ReplyHeader, RequestHeader};

use crate::error::{CoreError, Result};

const REQUEST_HEADER_SIZE: usize = 4 + 4 + 4 + 4 + 8 + 8 + zonar_wire::PATH_MAX;
const REPLY_HEADER_SIZE: usize = 4 + 4 + 4 + 4;

/// Socket send/receive buffer size for every zonar connection.
const SOCKET_BUFFER_SIZE: usize = 1 << 20;

/// Sets both socket buffers to [`SOCKET_BUFFER_SIZE`] on a freshly
/// connected or accepted stream. Failures are logged, not propagated —
/// the kernel clamps the request to `net.core.{r,w}mem_max` rather than
/// rejecting it outright, so a denied request here is not fatal to the
/// connection.
pub(crate) fn tune_socket_buffers(stream: &TcpStream) {
    let fd = stream.as_fd();
    if let Err(e) = setsockopt(&fd, sockopt::RcvBuf, &SOCKET_BUFFER_SIZE) {
        log::warn!("failed to set SO_RCVBUF: {e}");
    }
    if let Err(e) = setsockopt(&fd, sockopt::SndBuf, &SOCKET_BUFFER_SIZE) {
        log::warn!("failed to set SO_SNDBUF: {e}");
    }
}

fn send_all(stream: &mut TcpStream, buf: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < buf.len() {
        match stream.write(&buf[written..]) {
            Ok(0) => return Err(CoreError::ConnectionReset),
            Ok(n) => written += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CoreError::Io(e)),
        }
    }
    Ok(())
}

fn recv_exact(stream: &mut TcpStream, buf: &mut [u8]) -> Result<()> {
    let mut got = 0;
    while got < buf.len() {
        match stream.read(&mut buf[got..]) {
            Ok(0) => return Err(CoreError::ConnectionReset),
            Ok(n) => got += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CoreError::Io(e)),
        }
    }
    Ok(())
}

pub(crate) fn send_request(stream: &mut TcpStream, req: &RequestHeader) -> Result<()> {
    let mut buf = Vec::with_capacity(REQUEST_HEADER_SIZE);
    req.write(&mut Cursor::new(&mut buf))
        .map_err(zonar_wire::WireError::from)?;
    send_all(stream, &buf)
}

pub(crate) fn recv_request(stream: &mut TcpStream) -> Result<RequestHeader> {
    let mut buf = vec![0u8; REQUEST_HEADER_SIZE];
    recv_exact(stream, &mut buf)?;
    Ok(RequestHeader::read(&mut Cursor::new(&buf)).map_err(zonar_wire::WireError::from)?)
}

pub(crate) fn send_reply(stream: &mut TcpStream, rep: &ReplyHeader, payload: &[u8]) -> Result<()> {
    let mut buf = Vec::with_capacity(REPLY_HEADER_SIZE + payload.len());
    rep.write(&mut Cursor::new(&mut buf))
        .map_err(zonar_wire::WireError::from)?;
    buf.extend_from_slice(payload);
    send_all(stream, &buf)
}

/// Reads a reply header and, if it reports success, its payload.
///
/// Marshaling always goes through this owned `Vec` rather than decoding
/// fields directly out of shared session state, so a reply that only
/// partially decodes never leaves session arrays half-overwritten.
pub(crate) fn recv_reply(stream: &mut TcpStream) -> Result<(ReplyHeader, Vec<u8>)> {
    let mut header_buf = [0u8; REPLY_HEADER_SIZE];
    recv_exact(stream, &mut header_buf)?;
    let rep = ReplyHeader::read(&mut Cursor::new(&header_buf)).map_err(zonar_wire::WireError::from)?;

    if rep.err != 0 {
        return Ok((rep, Vec::new()));
    }

    let mut payload = vec![0u8; rep.data_size as usize];
    recv_exact(stream, &mut payload)?;
    Ok((rep, payload))
}
