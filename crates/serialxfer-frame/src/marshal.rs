//! Typed payload packing and unpacking.
//!
//! Values are fixed-width and little-endian on the wire. There are no type
//! tags: both endpoints must agree on field order and types out of band.

use std::mem::size_of;

use bytes::{Buf, BufMut, BytesMut};

use crate::codec::DEFAULT_MAX_SEGMENT_SIZE;
use crate::error::{FrameError, Result};

macro_rules! append_fixed {
    ($($name:ident => $ty:ty, $put:ident;)*) => {
        $(
            #[doc = concat!("Append a `", stringify!($ty), "`.")]
            pub fn $name(&mut self, value: $ty) -> Result<()> {
                self.reserve(size_of::<$ty>())?;
                self.buf.$put(value);
                Ok(())
            }
        )*
    };
}

macro_rules! read_fixed {
    ($($name:ident => $ty:ty, $get:ident;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($ty), "` and advance the cursor.")]
            pub fn $name(&mut self) -> Result<$ty> {
                let mut src = self.take(size_of::<$ty>())?;
                Ok(src.$get())
            }
        )*
    };
}

/// Outgoing payload under construction.
///
/// Appends either succeed completely or leave the buffer untouched. The
/// buffer is not cleared by sending; call [`clear`](Self::clear) to start the
/// next packet.
#[derive(Debug, Clone)]
pub struct TxBuffer {
    buf: BytesMut,
    limit: usize,
}

impl Default for TxBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEGMENT_SIZE)
    }
}

impl TxBuffer {
    /// Empty buffer holding at most `limit` payload bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit),
            limit,
        }
    }

    append_fixed! {
        append_u8 => u8, put_u8;
        append_i8 => i8, put_i8;
        append_u16 => u16, put_u16_le;
        append_i16 => i16, put_i16_le;
        append_u32 => u32, put_u32_le;
        append_i32 => i32, put_i32_le;
        append_u64 => u64, put_u64_le;
        append_i64 => i64, put_i64_le;
        append_f32 => f32, put_f32_le;
        append_f64 => f64, put_f64_le;
    }

    /// Append a boolean as one byte (0 or 1).
    pub fn append_bool(&mut self, value: bool) -> Result<()> {
        self.append_u8(u8::from(value))
    }

    /// Append raw bytes with no length prefix.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Append bytes preceded by a one-byte length.
    pub fn append_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let needed = 1 + bytes.len();
        let len = u8::try_from(bytes.len()).map_err(|_| FrameError::PacketOverflow {
            needed,
            available: self.remaining(),
        })?;
        self.reserve(needed)?;
        self.buf.put_u8(len);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Append a UTF-8 string preceded by a one-byte length.
    pub fn append_str(&mut self, value: &str) -> Result<()> {
        self.append_prefixed_bytes(value.as_bytes())
    }

    /// Committed payload bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Current payload length (the write cursor).
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum payload length.
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    /// Reset the cursor to zero.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn reserve(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(FrameError::PacketOverflow { needed, available });
        }
        Ok(())
    }
}

/// A received, checksum-validated payload with a read cursor.
///
/// Failed reads leave the cursor where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxPayload {
    id: u8,
    data: Vec<u8>,
    pos: usize,
}

impl RxPayload {
    /// Cursor over `data`, positioned at the start.
    pub fn new(id: u8, data: Vec<u8>) -> Self {
        Self { id, data, pos: 0 }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            id: 0,
            data: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    /// Overwrite with a newly completed packet, reusing the allocation.
    pub(crate) fn fill(&mut self, id: u8, payload: &[u8]) {
        self.id = id;
        self.data.clear();
        self.data.extend_from_slice(payload);
        self.pos = 0;
    }

    /// Packet identifier.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Payload length declared by the frame.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// The whole payload, regardless of the cursor.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    read_fixed! {
        read_u8 => u8, get_u8;
        read_i8 => i8, get_i8;
        read_u16 => u16, get_u16_le;
        read_i16 => i16, get_i16_le;
        read_u32 => u32, get_u32_le;
        read_i32 => i32, get_i32_le;
        read_u64 => u64, get_u64_le;
        read_i64 => i64, get_i64_le;
        read_f32 => f32, get_f32_le;
        read_f64 => f64, get_f64_le;
    }

    /// Read a one-byte boolean; any non-zero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        self.take(len)
    }

    /// Read bytes preceded by a one-byte length.
    pub fn read_prefixed_bytes(&mut self) -> Result<&[u8]> {
        let (start, end) = self.prefixed_span()?;
        self.pos = end;
        Ok(&self.data[start..end])
    }

    /// Read a UTF-8 string preceded by a one-byte length.
    pub fn read_str(&mut self) -> Result<&str> {
        let (start, end) = self.prefixed_span()?;
        let text = std::str::from_utf8(&self.data[start..end]).map_err(|_| FrameError::InvalidUtf8)?;
        self.pos = end;
        Ok(text)
    }

    fn prefixed_span(&self) -> Result<(usize, usize)> {
        self.check(1)?;
        let len = usize::from(self.data[self.pos]);
        self.check(1 + len)?;
        let start = self.pos + 1;
        Ok((start, start + len))
    }

    fn check(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(FrameError::PacketUnderflow { needed, remaining });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        self.check(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.data[start..self.pos])
    }
}
