use crate::stuffing::StuffError;

/// Errors surfaced to callers of the packet layer.
///
/// Framing problems on the receive side (bad checksum, bad length, stalls)
/// are not errors: the parser drops the frame and resynchronizes. See
/// [`FramingFault`](crate::parser::FramingFault).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An append would grow the payload past the segment limit.
    #[error("packet overflow ({needed} bytes needed, {available} available)")]
    PacketOverflow { needed: usize, available: usize },

    /// A read would run past the end of the received payload.
    #[error("packet underflow ({needed} bytes needed, {remaining} remaining)")]
    PacketUnderflow { needed: usize, remaining: usize },

    /// A length-prefixed string is not valid UTF-8.
    #[error("payload string is not valid UTF-8")]
    InvalidUtf8,

    /// The connection accepted only part of a frame.
    #[error("short write ({written} of {expected} bytes)")]
    Write { written: usize, expected: usize },

    /// The frame body could not be stuffed.
    #[error("stuffing failed: {0}")]
    Stuffing(#[from] StuffError),

    /// The link configuration is inconsistent.
    #[error("invalid link configuration: {0}")]
    InvalidConfig(&'static str),

    /// An I/O error occurred on the connection.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
