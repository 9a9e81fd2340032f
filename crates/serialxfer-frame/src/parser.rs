//! Incremental receive-side frame parser.
//!
//! The parser consumes bytes as they arrive, in any fragmentation, and
//! exposes each checksum-validated payload through [`Parser::payload`].
//! Structural problems never surface as errors: the frame in progress is
//! dropped, the fault is counted, and parsing resumes at the next start
//! marker.

use std::time::Instant;

use tracing::{debug, trace};

use crate::codec::{LinkConfig, HEADER_SIZE};
use crate::crc::Crc8;
use crate::error::Result;
use crate::marshal::RxPayload;
use crate::stuffing::Stuffer;

/// Where the parser is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Discarding bytes until a start marker.
    WaitStart,
    /// Expecting the overhead count byte.
    WaitOverheadCount,
    /// Collecting escape offsets.
    WaitOverheadOffsets { remaining: u8 },
    /// Expecting the packet identifier.
    WaitId,
    /// Expecting the payload length.
    WaitLen,
    /// Collecting payload bytes.
    ReadPayload { remaining: u8 },
    /// Expecting the checksum byte.
    WaitCrc,
}

/// Why a frame in progress was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingFault {
    /// The length byte exceeds the segment limit.
    InvalidLength,
    /// The recomputed checksum disagrees with the received one.
    ChecksumMismatch,
    /// The overhead field is inconsistent with the frame.
    MalformedOverhead,
    /// A start marker arrived where only stuffed bytes may appear.
    UnexpectedMarker,
    /// Bytes stopped arriving mid-frame for longer than the timeout.
    Timeout,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseEvent {
    /// More bytes are needed.
    Pending,
    /// A frame completed; its payload is available via [`Parser::payload`].
    Complete { id: u8 },
    /// The frame in progress was discarded.
    Dropped(FramingFault),
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub packets: u64,
    pub invalid_length: u64,
    pub checksum_mismatch: u64,
    pub malformed_overhead: u64,
    pub unexpected_marker: u64,
    pub timeouts: u64,
}

impl ParserStats {
    /// Total frames discarded for any reason.
    pub fn dropped(&self) -> u64 {
        self.invalid_length
            + self.checksum_mismatch
            + self.malformed_overhead
            + self.unexpected_marker
            + self.timeouts
    }

    fn record(&mut self, fault: FramingFault) {
        let counter = match fault {
            FramingFault::InvalidLength => &mut self.invalid_length,
            FramingFault::ChecksumMismatch => &mut self.checksum_mismatch,
            FramingFault::MalformedOverhead => &mut self.malformed_overhead,
            FramingFault::UnexpectedMarker => &mut self.unexpected_marker,
            FramingFault::Timeout => &mut self.timeouts,
        };
        *counter += 1;
    }
}

/// Frame reassembly state for one connection.
///
/// Buffers are sized once from the configuration and never grow.
#[derive(Debug)]
pub struct Parser {
    config: LinkConfig,
    crc: Crc8,
    stuffer: Stuffer,
    state: ParseState,
    offsets: Vec<u8>,
    body: Vec<u8>,
    last_byte_at: Option<Instant>,
    payload: Option<RxPayload>,
    stats: ParserStats,
}

impl Default for Parser {
    fn default() -> Self {
        Self::from_valid(LinkConfig::default())
    }
}

impl Parser {
    /// Create a parser for `config`.
    pub fn new(config: LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: LinkConfig) -> Self {
        let body_capacity = HEADER_SIZE + config.max_segment_size;
        Self {
            crc: Crc8::for_polynomial(config.crc_polynomial),
            stuffer: config.stuffer(),
            state: ParseState::WaitStart,
            offsets: Vec::with_capacity(body_capacity),
            body: Vec::with_capacity(body_capacity),
            last_byte_at: None,
            payload: None,
            stats: ParserStats::default(),
            config,
        }
    }

    /// Feed one byte received at `now`.
    ///
    /// If the frame in progress has stalled past the timeout it is dropped
    /// first and `byte` is interpreted from [`ParseState::WaitStart`].
    pub fn feed_byte(&mut self, byte: u8, now: Instant) -> ParseEvent {
        let timed_out = self.check_timeout(now);
        self.last_byte_at = Some(now);
        let event = self.step(byte);
        if timed_out && event == ParseEvent::Pending {
            ParseEvent::Dropped(FramingFault::Timeout)
        } else {
            event
        }
    }

    /// Feed a chunk, calling `on_packet` for each completed frame in order.
    ///
    /// Returns the number of packets completed.
    pub fn feed<F>(&mut self, chunk: &[u8], now: Instant, mut on_packet: F) -> usize
    where
        F: FnMut(&mut RxPayload),
    {
        let mut completed = 0;
        for &byte in chunk {
            if let ParseEvent::Complete { .. } = self.feed_byte(byte, now) {
                completed += 1;
                if let Some(payload) = self.payload.as_mut() {
                    on_packet(payload);
                }
            }
        }
        completed
    }

    /// Drop a stalled frame without waiting for another byte.
    ///
    /// Returns `true` if a frame was discarded.
    pub fn check_timeout(&mut self, now: Instant) -> bool {
        if self.state == ParseState::WaitStart {
            return false;
        }
        match self.last_byte_at {
            Some(last) if now.saturating_duration_since(last) > self.config.timeout => {
                self.fault(FramingFault::Timeout);
                true
            }
            _ => false,
        }
    }

    /// Latest completed payload, if any.
    pub fn payload(&self) -> Option<&RxPayload> {
        self.payload.as_ref()
    }

    /// Latest completed payload, for cursor reads.
    pub fn payload_mut(&mut self) -> Option<&mut RxPayload> {
        self.payload.as_mut()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn stats(&self) -> &ParserStats {
        &self.stats
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Abandon any frame in progress.
    pub fn reset(&mut self) {
        self.state = ParseState::WaitStart;
        self.offsets.clear();
        self.body.clear();
    }

    fn step(&mut self, byte: u8) -> ParseEvent {
        let marker = self.config.start_marker;
        match self.state {
            ParseState::WaitStart => {
                if byte == marker {
                    self.state = ParseState::WaitOverheadCount;
                }
                ParseEvent::Pending
            }
            ParseState::WaitOverheadCount => {
                if usize::from(byte) > HEADER_SIZE + self.config.max_segment_size {
                    return self.fault(FramingFault::MalformedOverhead);
                }
                self.state = match byte {
                    0 => ParseState::WaitId,
                    n => ParseState::WaitOverheadOffsets { remaining: n },
                };
                ParseEvent::Pending
            }
            ParseState::WaitOverheadOffsets { remaining } => {
                if self.offsets.last().is_some_and(|&prev| byte <= prev) {
                    return self.fault(FramingFault::MalformedOverhead);
                }
                self.offsets.push(byte);
                self.state = match remaining {
                    1 => ParseState::WaitId,
                    n => ParseState::WaitOverheadOffsets { remaining: n - 1 },
                };
                ParseEvent::Pending
            }
            ParseState::WaitId => {
                if byte == marker {
                    return self.restart();
                }
                self.body.push(byte);
                self.state = ParseState::WaitLen;
                ParseEvent::Pending
            }
            ParseState::WaitLen => {
                if byte == marker {
                    return self.restart();
                }
                self.body.push(byte);
                let len = if self.offsets.contains(&1) {
                    marker
                } else {
                    byte
                };
                if usize::from(len) > self.config.max_segment_size {
                    return self.fault(FramingFault::InvalidLength);
                }
                let body_len = HEADER_SIZE + usize::from(len);
                if self
                    .offsets
                    .last()
                    .is_some_and(|&last| usize::from(last) >= body_len)
                {
                    return self.fault(FramingFault::MalformedOverhead);
                }
                self.state = match len {
                    0 => ParseState::WaitCrc,
                    n => ParseState::ReadPayload { remaining: n },
                };
                ParseEvent::Pending
            }
            ParseState::ReadPayload { remaining } => {
                if byte == marker {
                    return self.restart();
                }
                self.body.push(byte);
                self.state = match remaining {
                    1 => ParseState::WaitCrc,
                    n => ParseState::ReadPayload { remaining: n - 1 },
                };
                ParseEvent::Pending
            }
            ParseState::WaitCrc => self.finish(byte),
        }
    }

    fn finish(&mut self, checksum: u8) -> ParseEvent {
        if let Err(err) = self.stuffer.unstuff_in_place(&mut self.body, &self.offsets) {
            debug!(error = %err, "malformed escape layout");
            return self.reject(checksum, FramingFault::MalformedOverhead);
        }
        let expected = self.crc.compute(&self.body);
        if expected != checksum {
            debug!(expected, received = checksum, "checksum mismatch");
            return self.reject(checksum, FramingFault::ChecksumMismatch);
        }

        let id = self.body[0];
        let capacity = self.config.max_segment_size;
        let payload = self
            .payload
            .get_or_insert_with(|| RxPayload::with_capacity(capacity));
        payload.fill(id, &self.body[HEADER_SIZE..]);
        self.stats.packets += 1;
        trace!(id, len = payload.len(), "packet complete");

        self.reset();
        ParseEvent::Complete { id }
    }

    /// A raw marker inside the body means the frame was truncated and a new
    /// one has begun.
    fn restart(&mut self) -> ParseEvent {
        let event = self.fault(FramingFault::UnexpectedMarker);
        self.state = ParseState::WaitOverheadCount;
        event
    }

    /// A marker in the checksum slot of a bad frame is the next frame's
    /// start, arriving early because bytes were lost.
    fn reject(&mut self, checksum: u8, fault: FramingFault) -> ParseEvent {
        let event = self.fault(fault);
        if checksum == self.config.start_marker {
            self.state = ParseState::WaitOverheadCount;
        }
        event
    }

    fn fault(&mut self, fault: FramingFault) -> ParseEvent {
        debug!(?fault, state = ?self.state, "dropping frame");
        self.stats.record(fault);
        self.reset();
        ParseEvent::Dropped(fault)
    }
}
