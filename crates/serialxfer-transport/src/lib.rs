//! Byte-stream connection contract for serialxfer.
//!
//! This is the lowest layer of serialxfer. The packet layer only ever talks to
//! a [`Connection`]: a non-blocking byte source and sink with no protocol
//! awareness. Implementations provided here:
//! - [`SerialConnection`] over a real serial device (USB-serial, UART)
//! - [`MemoryConnection`], an in-process loopback for tests and demos
//!
//! Port enumeration and shorthand resolution live in [`ports`].

pub mod error;
pub mod memory;
pub mod ports;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryConnection;
pub use ports::{available_ports, resolve_port, PortPolicy};
pub use serial::{SerialConfig, SerialConnection, DEFAULT_BAUD_RATE};
pub use traits::Connection;
