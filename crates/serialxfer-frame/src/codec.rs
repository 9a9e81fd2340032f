use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::{Crc8, DEFAULT_POLYNOMIAL};
use crate::error::{FrameError, Result};
use crate::marshal::RxPayload;
use crate::stuffing::Stuffer;

/// Frame delimiter.
pub const DEFAULT_START_MARKER: u8 = 0x7E;

/// Stand-in written where a start marker was escaped.
pub const DEFAULT_PLACEHOLDER: u8 = 0x00;

/// Default maximum payload size in bytes.
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 250;

/// Hard ceiling for `max_segment_size`: `packet_id` + `length` + payload must
/// be addressable by one-byte escape offsets and counted by one byte.
pub const MAX_SEGMENT_LIMIT: usize = 253;

/// Default inter-byte timeout for an in-progress frame.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// `packet_id` + `length`.
pub const HEADER_SIZE: usize = 2;

/// Start marker + overhead count + header + checksum.
pub const FIXED_OVERHEAD: usize = 1 + 1 + HEADER_SIZE + 1;

/// A validated packet: identifier plus unstuffed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Application-defined packet identifier.
    pub id: u8,
    /// The payload bytes.
    pub payload: Bytes,
}

impl Packet {
    /// Create a new packet.
    pub fn new(id: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }

    /// Cursor over the payload for typed reads.
    pub fn reader(&self) -> RxPayload {
        RxPayload::new(self.id, self.payload.to_vec())
    }
}

/// Link-level protocol parameters shared by both endpoints.
///
/// Both ends must agree on every field; nothing here is negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Frame delimiter byte.
    pub start_marker: u8,
    /// Byte substituted for escaped markers. Must differ from `start_marker`.
    pub placeholder: u8,
    /// Maximum payload size in bytes. Default: 250, at most 253.
    pub max_segment_size: usize,
    /// Stall after which a partially received frame is discarded.
    pub timeout: Duration,
    /// CRC-8 generator polynomial.
    pub crc_polynomial: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            start_marker: DEFAULT_START_MARKER,
            placeholder: DEFAULT_PLACEHOLDER,
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            timeout: DEFAULT_TIMEOUT,
            crc_polynomial: DEFAULT_POLYNOMIAL,
        }
    }
}

impl LinkConfig {
    /// Reject configurations the wire format cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.placeholder == self.start_marker {
            return Err(FrameError::InvalidConfig(
                "placeholder must differ from start marker",
            ));
        }
        if self.max_segment_size > MAX_SEGMENT_LIMIT {
            return Err(FrameError::InvalidConfig(
                "max_segment_size exceeds 253 bytes",
            ));
        }
        if self.timeout.is_zero() {
            return Err(FrameError::InvalidConfig("timeout must be non-zero"));
        }
        Ok(())
    }

    /// Largest possible frame on the wire, all bytes escaped.
    pub fn max_frame_size(&self) -> usize {
        FIXED_OVERHEAD + (HEADER_SIZE + self.max_segment_size) + self.max_segment_size
    }

    pub fn stuffer(&self) -> Stuffer {
        Stuffer::new(self.start_marker, self.placeholder)
    }
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────┬──────────────┬───────────┬────────┬──────────────────┬──────────┐
/// │ Start  │ Overhead     │ Packet ID │ Length │ Payload          │ Checksum │
/// │ (1B)   │ (1B + 1B/esc)│ (1B)      │ (1B)   │ (Length, stuffed)│ (1B)     │
/// └────────┴──────────────┴───────────┴────────┴──────────────────┴──────────┘
/// ```
///
/// The checksum covers the unstuffed packet ID, length and payload.
pub fn encode_packet(
    id: u8,
    payload: &[u8],
    config: &LinkConfig,
    crc: &Crc8,
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > config.max_segment_size {
        return Err(FrameError::PacketOverflow {
            needed: payload.len(),
            available: config.max_segment_size,
        });
    }

    let mut body = Vec::with_capacity(HEADER_SIZE + payload.len());
    body.push(id);
    body.push(payload.len() as u8);
    body.extend_from_slice(payload);

    let checksum = crc.compute(&body);
    let overhead = config.stuffer().stuff_in_place(&mut body)?;

    dst.reserve(1 + overhead.encoded_len() + body.len() + 1);
    dst.put_u8(config.start_marker);
    overhead.encode(dst);
    dst.put_slice(&body);
    dst.put_u8(checksum);
    Ok(())
}
