//! Byte-stuffed, checksummed packet framing for serial links.
//!
//! Every packet travels as one frame:
//! - a start marker (`0x7E`) that never appears anywhere else in the frame
//! - an overhead field listing where markers were escaped
//! - packet id, payload length and payload
//! - a CRC-8 over the unescaped id, length and payload
//!
//! The receive side is an incremental [`Parser`] that accepts bytes in any
//! fragmentation, drops damaged or stalled frames and resynchronizes on the
//! next start marker. [`Link`] ties a writer, a reader and per-id callbacks to
//! one [`Connection`](serialxfer_transport::Connection).

pub mod codec;
pub mod crc;
pub mod error;
pub mod link;
pub mod marshal;
pub mod parser;
pub mod reader;
pub mod stuffing;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    encode_packet, LinkConfig, Packet, DEFAULT_MAX_SEGMENT_SIZE, DEFAULT_PLACEHOLDER,
    DEFAULT_START_MARKER, DEFAULT_TIMEOUT, MAX_SEGMENT_LIMIT,
};
pub use crc::{Crc8, CRC8, DEFAULT_POLYNOMIAL};
pub use error::{FrameError, Result};
pub use link::Link;
pub use marshal::{RxPayload, TxBuffer};
pub use parser::{FramingFault, ParseEvent, ParseState, Parser, ParserStats};
pub use reader::PacketReader;
pub use stuffing::{Overhead, StuffError, Stuffer};
pub use writer::PacketWriter;

#[cfg(feature = "async")]
pub use tokio_codec::PacketCodec;
