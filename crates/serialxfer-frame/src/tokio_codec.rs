//! [`tokio_util::codec`] adapter for framed async streams.

use std::time::Instant;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_packet, LinkConfig, Packet};
use crate::crc::Crc8;
use crate::error::{FrameError, Result};
use crate::parser::{ParseEvent, Parser, ParserStats};

/// Packet codec for `FramedRead` / `FramedWrite` over async byte streams.
///
/// Decoding shares the synchronous parser, so resynchronization and the
/// stall timeout behave exactly as they do for [`PacketReader`](crate::PacketReader).
#[derive(Debug, Default)]
pub struct PacketCodec {
    parser: Parser,
    crc: Crc8,
}

impl PacketCodec {
    pub fn new(config: LinkConfig) -> Result<Self> {
        let crc = Crc8::for_polynomial(config.crc_polynomial);
        Ok(Self {
            parser: Parser::new(config)?,
            crc,
        })
    }

    pub fn stats(&self) -> &ParserStats {
        self.parser.stats()
    }

    pub fn config(&self) -> &LinkConfig {
        self.parser.config()
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        let now = Instant::now();
        self.parser.check_timeout(now);

        let mut consumed = 0;
        let mut packet = None;
        for &byte in src.iter() {
            consumed += 1;
            if let ParseEvent::Complete { id } = self.parser.feed_byte(byte, now) {
                packet = self
                    .parser
                    .payload()
                    .map(|rx| Packet::new(id, rx.as_slice().to_vec()));
                break;
            }
        }
        src.advance(consumed);
        Ok(packet)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        encode_packet(item.id, &item.payload, self.parser.config(), &self.crc, dst)
    }
}
