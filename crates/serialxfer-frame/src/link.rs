use std::time::Instant;

use serialxfer_transport::Connection;
use tracing::debug;

use crate::codec::LinkConfig;
use crate::error::Result;
use crate::marshal::{RxPayload, TxBuffer};
use crate::parser::ParserStats;
use crate::reader::PacketReader;
use crate::writer::PacketWriter;

type Callback = Box<dyn FnMut(&mut RxPayload) + Send>;

/// One endpoint of a packet link over a single connection.
///
/// Outgoing payloads are staged in [`tx`](Self::tx) and sent with
/// [`send`](Self::send). Incoming packets are picked up by
/// [`available`](Self::available) or dispatched by id through
/// [`tick`](Self::tick).
///
/// ```
/// use serialxfer_frame::Link;
/// use serialxfer_transport::MemoryConnection;
///
/// let (a, b) = MemoryConnection::pair();
/// let mut left = Link::new(a);
/// let mut right = Link::new(b);
///
/// left.tx().append_u16(0xBEEF).unwrap();
/// left.send(1).unwrap();
///
/// assert_eq!(right.available().unwrap(), Some(1));
/// assert_eq!(right.rx().unwrap().read_u16().unwrap(), 0xBEEF);
/// ```
pub struct Link<C> {
    conn: C,
    tx: TxBuffer,
    writer: PacketWriter,
    reader: PacketReader,
    callbacks: Vec<Option<Callback>>,
}

impl<C: Connection> Link<C> {
    /// Create a link with the default configuration.
    pub fn new(conn: C) -> Self {
        let tx = TxBuffer::default();
        Self::from_parts(conn, tx, PacketWriter::default(), PacketReader::default())
    }

    /// Create a link with explicit configuration.
    pub fn with_config(conn: C, config: LinkConfig) -> Result<Self> {
        let tx = TxBuffer::new(config.max_segment_size);
        let writer = PacketWriter::with_config(config.clone())?;
        let reader = PacketReader::new(config)?;
        Ok(Self::from_parts(conn, tx, writer, reader))
    }

    fn from_parts(conn: C, tx: TxBuffer, writer: PacketWriter, reader: PacketReader) -> Self {
        Self {
            conn,
            tx,
            writer,
            reader,
            callbacks: (0..=u8::MAX).map(|_| None).collect(),
        }
    }

    /// Staging buffer for the next outgoing payload.
    pub fn tx(&mut self) -> &mut TxBuffer {
        &mut self.tx
    }

    /// Send the staged payload as packet `id`.
    ///
    /// The staging buffer keeps its contents; call [`TxBuffer::clear`] before
    /// building the next payload.
    pub fn send(&mut self, id: u8) -> Result<usize> {
        self.writer.send(&mut self.conn, id, self.tx.as_slice())
    }

    /// Send `payload` directly, bypassing the staging buffer.
    pub fn send_bytes(&mut self, id: u8, payload: &[u8]) -> Result<usize> {
        self.writer.send(&mut self.conn, id, payload)
    }

    /// Poll the connection once. Returns the id of a completed packet.
    pub fn available(&mut self) -> Result<Option<u8>> {
        self.reader.poll(&mut self.conn)
    }

    /// Like [`available`](Self::available), with an explicit clock reading.
    pub fn available_at(&mut self, now: Instant) -> Result<Option<u8>> {
        self.reader.poll_at(&mut self.conn, now)
    }

    /// The most recently completed payload.
    pub fn rx(&mut self) -> Option<&mut RxPayload> {
        self.reader.payload_mut()
    }

    /// Run `callback` for every packet received with `id`.
    pub fn set_callback<F>(&mut self, id: u8, callback: F)
    where
        F: FnMut(&mut RxPayload) + Send + 'static,
    {
        self.callbacks[usize::from(id)] = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self, id: u8) {
        self.callbacks[usize::from(id)] = None;
    }

    /// Poll once and dispatch a completed packet to its callback.
    ///
    /// Returns the id of the completed packet, whether or not a callback
    /// handled it. Unhandled packets stay available through [`rx`](Self::rx).
    pub fn tick(&mut self) -> Result<Option<u8>> {
        let received = self.available()?;
        if let Some(id) = received {
            self.dispatch(id);
        }
        Ok(received)
    }

    fn dispatch(&mut self, id: u8) {
        let Some(payload) = self.reader.payload_mut() else {
            return;
        };
        match self.callbacks[usize::from(id)].as_mut() {
            Some(callback) => {
                payload.rewind();
                callback(payload);
            }
            None => debug!(id, "no callback registered for packet"),
        }
    }

    pub fn stats(&self) -> &ParserStats {
        self.reader.stats()
    }

    pub fn config(&self) -> &LinkConfig {
        self.writer.config()
    }

    pub fn get_ref(&self) -> &C {
        &self.conn
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for Link<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self.callbacks.iter().filter(|cb| cb.is_some()).count();
        f.debug_struct("Link")
            .field("conn", &self.conn)
            .field("tx", &self.tx)
            .field("callbacks", &registered)
            .finish_non_exhaustive()
    }
}
