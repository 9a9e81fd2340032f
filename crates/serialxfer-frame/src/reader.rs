use std::io::ErrorKind;
use std::time::Instant;

use serialxfer_transport::Connection;

use crate::codec::LinkConfig;
use crate::error::Result;
use crate::marshal::RxPayload;
use crate::parser::{ParseEvent, Parser, ParserStats};

const READ_CHUNK: usize = 64;

/// Pulls bytes from a [`Connection`] into a [`Parser`] without blocking.
///
/// A poll stops at the first completed packet. Bytes already read past the
/// end of that packet are kept and consumed by the next poll, so each
/// completion is observable before the next one overwrites the payload.
#[derive(Debug)]
pub struct PacketReader {
    parser: Parser,
    chunk: Box<[u8]>,
    start: usize,
    end: usize,
}

impl Default for PacketReader {
    fn default() -> Self {
        Self::from_parser(Parser::default())
    }
}

impl PacketReader {
    pub fn new(config: LinkConfig) -> Result<Self> {
        Ok(Self::from_parser(Parser::new(config)?))
    }

    fn from_parser(parser: Parser) -> Self {
        Self {
            parser,
            chunk: vec![0u8; READ_CHUNK].into_boxed_slice(),
            start: 0,
            end: 0,
        }
    }

    /// Poll using the current time.
    pub fn poll<C>(&mut self, conn: &mut C) -> Result<Option<u8>>
    where
        C: Connection + ?Sized,
    {
        self.poll_at(conn, Instant::now())
    }

    /// Consume what the connection has buffered, as observed at `now`.
    ///
    /// Returns the packet id if a frame completed. Only bytes reported by
    /// [`Connection::bytes_available`] at the start of the call are read.
    pub fn poll_at<C>(&mut self, conn: &mut C, now: Instant) -> Result<Option<u8>>
    where
        C: Connection + ?Sized,
    {
        self.parser.check_timeout(now);

        if let Some(id) = self.drain(now) {
            return Ok(Some(id));
        }

        let mut budget = conn.bytes_available()?;
        while budget > 0 {
            let want = budget.min(self.chunk.len());
            let n = match conn.read(&mut self.chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if n == 0 {
                break;
            }
            budget = budget.saturating_sub(n);
            self.start = 0;
            self.end = n;

            if let Some(id) = self.drain(now) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    fn drain(&mut self, now: Instant) -> Option<u8> {
        while self.start < self.end {
            let byte = self.chunk[self.start];
            self.start += 1;
            if let ParseEvent::Complete { id } = self.parser.feed_byte(byte, now) {
                return Some(id);
            }
        }
        None
    }

    /// Bytes read from the connection but not yet parsed.
    pub fn pending(&self) -> usize {
        self.end - self.start
    }

    pub fn payload(&self) -> Option<&RxPayload> {
        self.parser.payload()
    }

    pub fn payload_mut(&mut self) -> Option<&mut RxPayload> {
        self.parser.payload_mut()
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn stats(&self) -> &ParserStats {
        self.parser.stats()
    }

    pub fn config(&self) -> &LinkConfig {
        self.parser.config()
    }
}
