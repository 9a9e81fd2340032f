//! Packetized, checksummed transfer over serial links.
//!
//! serialxfer frames application payloads into delimited, byte-stuffed,
//! CRC-8 checked packets and reassembles them from a raw byte stream that may
//! arrive fragmented, corrupted or with noise between frames.
//!
//! # Crate Structure
//!
//! - [`transport`]: the byte-stream [`Connection`](transport::Connection)
//!   contract, the serial port adapter and port resolution
//! - [`frame`]: checksum, stuffing, typed payload access, the packet builder,
//!   the incremental parser and [`Link`](frame::Link)

/// Re-export transport types.
pub mod transport {
    pub use serialxfer_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serialxfer_frame::*;
}
