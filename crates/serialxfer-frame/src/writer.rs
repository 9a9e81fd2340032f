use std::io::ErrorKind;

use bytes::BytesMut;
use serialxfer_transport::Connection;
use tracing::trace;

use crate::codec::{encode_packet, LinkConfig};
use crate::crc::Crc8;
use crate::error::{FrameError, Result};

/// Encodes packets and writes each one to a [`Connection`] in a single call.
///
/// A short write is reported as [`FrameError::Write`]; nothing is retried.
#[derive(Debug)]
pub struct PacketWriter {
    buf: BytesMut,
    crc: Crc8,
    config: LinkConfig,
}

impl Default for PacketWriter {
    fn default() -> Self {
        Self::from_valid(LinkConfig::default())
    }
}

impl PacketWriter {
    /// Create a packet writer with explicit configuration.
    pub fn with_config(config: LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: LinkConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.max_frame_size()),
            crc: Crc8::for_polynomial(config.crc_polynomial),
            config,
        }
    }

    /// Encode a frame into the internal scratch buffer and return it.
    pub fn encode(&mut self, id: u8, payload: &[u8]) -> Result<&[u8]> {
        self.buf.clear();
        encode_packet(id, payload, &self.config, &self.crc, &mut self.buf)?;
        Ok(&self.buf)
    }

    /// Encode and write one packet, returning the frame size.
    pub fn send<C>(&mut self, conn: &mut C, id: u8, payload: &[u8]) -> Result<usize>
    where
        C: Connection + ?Sized,
    {
        self.encode(id, payload)?;
        let expected = self.buf.len();

        let written = loop {
            match conn.write(&self.buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        };
        if written != expected {
            return Err(FrameError::Write { written, expected });
        }

        conn.flush()?;
        trace!(id, len = payload.len(), frame = expected, "packet sent");
        Ok(written)
    }

    /// Current writer configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}
