use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serialxfer_frame::{FrameError, Link, LinkConfig, PacketWriter, DEFAULT_START_MARKER};
use serialxfer_transport::MemoryConnection;

fn linked() -> (Link<MemoryConnection>, Link<MemoryConnection>) {
    let (a, b) = MemoryConnection::pair();
    (Link::new(a), Link::new(b))
}

#[test]
fn escaped_payload_survives_loopback() {
    let (mut left, mut right) = linked();
    let payload = [0x01, 0x02, DEFAULT_START_MARKER, 0x03];

    left.send_bytes(5, &payload).unwrap();

    assert_eq!(right.available().unwrap(), Some(5));
    let rx = right.rx().unwrap();
    assert_eq!(rx.id(), 5);
    assert_eq!(rx.as_slice(), &payload);
}

#[test]
fn both_directions_interleave() {
    let (mut left, mut right) = linked();

    left.tx().append_u32(0xDEAD_BEEF).unwrap();
    left.send(1).unwrap();
    right.tx().append_i16(-2).unwrap();
    right.send(2).unwrap();

    assert_eq!(right.available().unwrap(), Some(1));
    assert_eq!(right.rx().unwrap().read_u32().unwrap(), 0xDEAD_BEEF);
    assert_eq!(left.available().unwrap(), Some(2));
    assert_eq!(left.rx().unwrap().read_i16().unwrap(), -2);
}

#[test]
fn full_segment_of_markers() {
    let (mut left, mut right) = linked();
    let payload = vec![DEFAULT_START_MARKER; left.config().max_segment_size];

    left.send_bytes(DEFAULT_START_MARKER, &payload).unwrap();

    assert_eq!(right.available().unwrap(), Some(DEFAULT_START_MARKER));
    assert_eq!(right.rx().unwrap().as_slice(), payload.as_slice());
}

#[test]
fn callbacks_receive_every_packet_in_order() {
    let (mut left, mut right) = linked();
    let log = Arc::new(Mutex::new(Vec::new()));

    for id in [10u8, 11] {
        let log = Arc::clone(&log);
        right.set_callback(id, move |rx| {
            let value = rx.read_u8().unwrap();
            log.lock().unwrap().push((rx.id(), value));
        });
    }

    for (id, value) in [(10, 1), (11, 2), (10, 3)] {
        left.send_bytes(id, &[value]).unwrap();
    }
    while right.tick().unwrap().is_some() {}

    assert_eq!(*log.lock().unwrap(), vec![(10, 1), (11, 2), (10, 3)]);
    assert_eq!(right.stats().packets, 3);
}

#[test]
fn noise_between_frames_is_skipped() {
    let conn = MemoryConnection::new();
    let feed = conn.clone();
    let mut right = Link::new(conn);
    let mut writer = PacketWriter::default();

    let mut wire = vec![0x00, 0xFF, 0x13];
    wire.extend_from_slice(writer.encode(1, b"one").unwrap());
    wire.extend_from_slice(&[0x42, 0x42]);
    wire.extend_from_slice(writer.encode(2, b"two").unwrap());
    feed.inject(&wire);

    assert_eq!(right.available().unwrap(), Some(1));
    assert_eq!(right.available().unwrap(), Some(2));
    assert_eq!(right.rx().unwrap().as_slice(), b"two");
}

#[test]
fn corrupted_frame_dropped_then_recovers() {
    let conn = MemoryConnection::new();
    let feed = conn.clone();
    let mut right = Link::new(conn);
    let mut writer = PacketWriter::default();

    let mut bad = writer.encode(1, b"payload").unwrap().to_vec();
    let last = bad.len() - 1;
    bad[last] ^= 0x01;
    feed.inject(&bad);
    feed.inject(writer.encode(2, b"good").unwrap());

    assert_eq!(right.available().unwrap(), Some(2));
    assert_eq!(right.stats().checksum_mismatch, 1);
}

#[test]
fn lost_byte_does_not_cost_following_frame() {
    let conn = MemoryConnection::new();
    let feed = conn.clone();
    let mut right = Link::new(conn);
    let mut writer = PacketWriter::default();

    let mut short = writer.encode(1, b"abcdef").unwrap().to_vec();
    short.remove(6);
    feed.inject(&short);
    feed.inject(writer.encode(2, b"intact").unwrap());

    assert_eq!(right.available().unwrap(), Some(2));
    assert_eq!(right.rx().unwrap().as_slice(), b"intact");
    assert_eq!(right.stats().checksum_mismatch, 1);
}

#[test]
fn stalled_frame_times_out_before_next_frame() {
    let conn = MemoryConnection::new();
    let feed = conn.clone();
    let mut right = Link::new(conn);
    let mut writer = PacketWriter::default();
    let start = Instant::now();

    let stalled = writer.encode(1, b"stalled").unwrap().to_vec();
    feed.inject(&stalled[..6]);
    assert_eq!(right.available_at(start).unwrap(), None);

    let later = start + Duration::from_millis(200);
    feed.inject(writer.encode(2, b"next").unwrap());
    assert_eq!(right.available_at(later).unwrap(), Some(2));
    assert_eq!(right.stats().timeouts, 1);
}

#[test]
fn short_write_surfaces_as_error() {
    let (mut a, _b) = MemoryConnection::pair();
    a.set_write_limit(Some(4));
    let mut left = Link::new(a);

    let err = left.send_bytes(1, b"more than four").unwrap_err();
    assert!(matches!(err, FrameError::Write { written: 4, .. }));
}

#[test]
fn mismatched_markers_never_deliver() {
    let (a, b) = MemoryConnection::pair();
    let mut left = Link::new(a);
    let custom = LinkConfig {
        start_marker: 0x55,
        ..LinkConfig::default()
    };
    let mut right = Link::with_config(b, custom).unwrap();

    left.send_bytes(1, b"hello").unwrap();
    assert_eq!(right.available().unwrap(), None);
}
