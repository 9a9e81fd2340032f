use std::io;

/// A raw, non-blocking byte source and sink.
///
/// The packet layer depends on nothing else: it asks how many bytes are
/// ready, drains exactly that many, and writes each frame in one call.
/// Implementations must never block in [`bytes_available`](Self::bytes_available)
/// or [`read`](Self::read).
pub trait Connection {
    /// Number of bytes that can be read right now without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` immediately available bytes.
    ///
    /// Returns `Ok(0)` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Attempt to write all of `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Flush any buffering below the connection.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
