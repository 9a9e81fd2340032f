use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Buf, BytesMut};

use crate::traits::Connection;

type Pipe = Arc<Mutex<BytesMut>>;

/// In-process connection backed by shared byte buffers.
///
/// [`MemoryConnection::pair`] wires two endpoints back to back, the way a
/// null-modem cable would. A standalone connection from
/// [`MemoryConnection::new`] receives whatever is passed to
/// [`inject`](Self::inject) and records everything written to it.
///
/// Writes can be capped or rejected to exercise short-write handling.
#[derive(Debug, Clone)]
pub struct MemoryConnection {
    rx: Pipe,
    tx: Pipe,
    write_limit: Option<usize>,
    reject_writes: bool,
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnection {
    /// Create a standalone connection with empty buffers.
    pub fn new() -> Self {
        Self {
            rx: Pipe::default(),
            tx: Pipe::default(),
            write_limit: None,
            reject_writes: false,
        }
    }

    /// Create two connections where each one reads what the other writes.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Pipe::default();
        let b_to_a = Pipe::default();
        let a = Self {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
            write_limit: None,
            reject_writes: false,
        };
        let b = Self {
            rx: a_to_b,
            tx: b_to_a,
            write_limit: None,
            reject_writes: false,
        };
        (a, b)
    }

    /// Queue bytes as if they had arrived from the far end.
    pub fn inject(&self, bytes: &[u8]) {
        lock(&self.rx).extend_from_slice(bytes);
    }

    /// Snapshot of everything written and not yet read by a peer.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.tx).to_vec()
    }

    /// Drain everything written so far.
    pub fn take_written(&self) -> Vec<u8> {
        lock(&self.tx).split().to_vec()
    }

    /// Accept at most `limit` bytes per write call (`None` = unlimited).
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// Make every write fail with `BrokenPipe`.
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }
}

impl Connection for MemoryConnection {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(lock(&self.rx).len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rx = lock(&self.rx);
        let n = rx.len().min(buf.len());
        buf[..n].copy_from_slice(&rx[..n]);
        rx.advance(n);
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.reject_writes {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory connection rejects writes",
            ));
        }
        let n = self.write_limit.map_or(bytes.len(), |limit| limit.min(bytes.len()));
        lock(&self.tx).extend_from_slice(&bytes[..n]);
        Ok(n)
    }
}

fn lock(pipe: &Pipe) -> MutexGuard<'_, BytesMut> {
    pipe.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_delivers_both_directions() {
        let (mut a, mut b) = MemoryConnection::pair();

        assert_eq!(a.write(b"ping").unwrap(), 4);
        assert_eq!(b.bytes_available().unwrap(), 4);

        let mut buf = [0u8; 8];
        let n = b.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(b.bytes_available().unwrap(), 0);

        b.write(b"pong").unwrap();
        let n = a.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[test]
    fn read_never_exceeds_buffer() {
        let mut conn = MemoryConnection::new();
        conn.inject(b"abcdef");

        let mut buf = [0u8; 4];
        assert_eq!(conn.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(conn.bytes_available().unwrap(), 2);
    }

    #[test]
    fn empty_read_returns_zero() {
        let mut conn = MemoryConnection::new();
        let mut buf = [0u8; 4];
        assert_eq!(conn.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn write_limit_truncates() {
        let mut conn = MemoryConnection::new();
        conn.set_write_limit(Some(3));

        assert_eq!(conn.write(b"hello").unwrap(), 3);
        assert_eq!(conn.take_written(), b"hel");
        assert!(conn.written().is_empty());
    }

    #[test]
    fn rejected_write_is_io_error() {
        let mut conn = MemoryConnection::new();
        conn.set_reject_writes(true);

        let err = conn.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn works_through_mut_reference() {
        let mut conn = MemoryConnection::new();
        conn.inject(b"z");
        let by_ref: &mut dyn Connection = &mut conn;
        let mut boxed: Box<&mut dyn Connection> = Box::new(by_ref);
        assert_eq!(boxed.bytes_available().unwrap(), 1);
    }
}
