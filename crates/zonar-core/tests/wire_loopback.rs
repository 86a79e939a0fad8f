//! Loopback exercise of the client-side decode functions against
//! hand-built replies, covering the packed (no count-prefix) wire shape
//! for `DEV_REP_ZONES` and `FILE_EXTENTS`.

use std::io::{Cursor, Read, Write};
use std::net::{TcpListener, TcpStream};

use binrw::prelude::*;

use zonar_wire::{ExtentRecord, ExtentTag, FixedStr, RequestId, ZoneCondition, ZoneRecord, ZoneType};

fn write_reply(stream: &mut TcpStream, id: RequestId, payload: &[u8]) {
    let rep = zonar_wire::ReplyHeader::ok(id, payload.len() as u32);
    let mut buf = Vec::new();
    rep.write(&mut Cursor::new(&mut buf)).unwrap();
    buf.extend_from_slice(payload);
    stream.write_all(&buf).unwrap();
}

fn read_request(stream: &mut TcpStream) -> zonar_wire::RequestHeader {
    const REQUEST_HEADER_SIZE: usize = 4 + 4 + 4 + 4 + 8 + 8 + zonar_wire::PATH_MAX;
    let mut buf = vec![0u8; REQUEST_HEADER_SIZE];
    stream.read_exact(&mut buf).unwrap();
    zonar_wire::RequestHeader::read(&mut Cursor::new(&buf)).unwrap()
}

fn encode<T: for<'a> BinWrite<Args<'a> = ()>>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.write(&mut Cursor::new(&mut buf)).unwrap();
    buf
}

#[test]
fn dev_rep_zones_decodes_packed_reply_with_no_count_prefix() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _req = read_request(&mut stream);

        let zones = [
            ZoneRecord {
                start: 0,
                len: 1024,
                wp: 0,
                capacity: 1024,
                type_: ZoneType::Conventional,
                cond: ZoneCondition::NotWp,
                non_seq: 0,
                reset: 0,
            },
            ZoneRecord {
                start: 1024,
                len: 1024,
                wp: 1200,
                capacity: 1024,
                type_: ZoneType::SeqWriteRequired,
                cond: ZoneCondition::ImplicitOpen,
                non_seq: 0,
                reset: 0,
            },
        ];
        let mut payload = Vec::new();
        for z in &zones {
            payload.extend_from_slice(&encode(z));
        }
        write_reply(&mut stream, RequestId::DevRepZones, &payload);
    });

    let mut client = TcpStream::connect(addr).unwrap();
    let zones = zonar_core::transport::client::dev_rep_zones(&mut client, 0, 2).unwrap();
    server.join().unwrap();

    assert_eq!(zones.len(), 2);
    assert!(zones[0].is_conventional());
    assert_eq!(zones[1].wp, 1200);
}

#[test]
fn dev_rep_zones_rejects_unaligned_payload() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _req = read_request(&mut stream);
        // One byte short of a single ZoneRecord: never valid regardless of
        // how many records the caller asked for.
        let payload = vec![0u8; ZoneRecord::WIRE_SIZE - 1];
        write_reply(&mut stream, RequestId::DevRepZones, &payload);
    });

    let mut client = TcpStream::connect(addr).unwrap();
    let err = zonar_core::transport::client::dev_rep_zones(&mut client, 0, 1).unwrap_err();
    server.join().unwrap();

    assert!(matches!(
        err,
        zonar_core::CoreError::Wire(zonar_wire::WireError::UnalignedPayload { .. })
    ));
}

#[test]
fn file_extents_decodes_packed_reply_with_no_count_prefix() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _req = read_request(&mut stream);

        let extents = [ExtentRecord {
            tag: ExtentTag::FileExtent,
            idx: 0,
            ino: 42,
            sector: 2048,
            nr_sectors: 16,
            info: FixedStr::new("ag=1"),
        }];
        let mut payload = Vec::new();
        for e in &extents {
            payload.extend_from_slice(&encode(e));
        }
        write_reply(&mut stream, RequestId::FileExtents, &payload);
    });

    let mut client = TcpStream::connect(addr).unwrap();
    let extents = zonar_core::transport::client::file_extents(&mut client, "/some/file").unwrap();
    server.join().unwrap();

    assert_eq!(extents.len(), 1);
    assert_eq!(extents[0].ino, 42);
    assert_eq!(extents[0].sector, 2048);
}
